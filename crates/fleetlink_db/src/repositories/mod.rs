//! Repository modules for database access
//!
//! Each entity has a trait describing its operations and a SQL implementation.

pub mod command;
pub mod command_sql;
pub mod device;
pub mod device_log;
pub mod device_log_sql;
pub mod device_sql;
pub mod factory;

pub use command::CommandRepository;
pub use command_sql::SqlCommandRepository;
pub use device::DeviceRepository;
pub use device_log::DeviceLogRepository;
pub use device_log_sql::SqlDeviceLogRepository;
pub use device_sql::SqlDeviceRepository;
pub use factory::{FleetRepositories, FleetRepositoryFactory};
