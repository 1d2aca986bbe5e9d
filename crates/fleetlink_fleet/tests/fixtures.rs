//! Test fixtures for the fleet gateway tests
//!
//! Every fixture runs against its own temporary SQLite file and a manual
//! clock starting at [`t0`].

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use fleetlink_common::{DeviceAttributes, ManualClock};
use fleetlink_config::{AppConfig, DatabaseConfig};
use fleetlink_db::{DbClient, FleetRepositoryFactory, RepositoryFactory};
use fleetlink_fleet::FleetService;
use std::sync::Arc;
use tempfile::TempDir;

/// A gateway backed by a temporary database. Keep it alive for the test's duration.
pub struct TestFleet {
    _dir: TempDir,
    pub service: FleetService,
    pub clock: ManualClock,
}

/// Fixed start time for the manual clock
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

/// Default configuration pointing at a database inside `dir`
pub fn create_test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: format!("sqlite:{}", dir.path().join("fleet.db").display()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn create_fleet() -> TestFleet {
    create_fleet_with(|_| {}).await
}

/// Build a fleet after letting the caller adjust the configuration
pub async fn create_fleet_with(adjust: impl FnOnce(&mut AppConfig)) -> TestFleet {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&dir);
    adjust(&mut config);

    let client = DbClient::new(&config).await.unwrap();
    let repositories = FleetRepositoryFactory::new().create_repository(client);
    repositories.init_schema().await.unwrap();

    let clock = ManualClock::new(t0());
    let service = FleetService::from_repositories(repositories, &config, Arc::new(clock.clone()));

    TestFleet {
        _dir: dir,
        service,
        clock,
    }
}

pub fn phone(name: &str) -> DeviceAttributes {
    DeviceAttributes {
        name: Some(name.to_string()),
        os_version: Some("14".to_string()),
        phone_number: None,
        battery_level: Some(80),
    }
}
