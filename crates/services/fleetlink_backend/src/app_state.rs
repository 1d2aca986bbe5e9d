use fleetlink_common::{Clock, SystemClock};
use fleetlink_config::AppConfig;
use fleetlink_db::{DbClient, DbError, FleetRepositoryFactory, RepositoryFactory};
use fleetlink_fleet::FleetService;
use std::sync::Arc;

/// Application state built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,

    /// The polling gateway handed to the fleet routes
    pub fleet: FleetService,
}

impl AppState {
    /// Connect to the database, create the schema and wire the gateway to the system clock.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, DbError> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(
        config: Arc<AppConfig>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DbError> {
        let db_client = DbClient::new(&config).await?;
        let repositories = FleetRepositoryFactory::new().create_repository(db_client);
        fleetlink_common::logging::log_result(
            repositories.init_schema().await,
            "Database schema ready",
            "Failed to initialize database schema",
        )?;

        let fleet = FleetService::from_repositories(repositories, &config, clock);
        Ok(Self { config, fleet })
    }
}
