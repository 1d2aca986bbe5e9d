//! SQL implementation of the device repository

use crate::convert::{device_from_row, to_millis, DEVICE_COLUMNS};
use crate::error::DbError;
use crate::repositories::device::DeviceRepository;
use crate::DbClient;
use chrono::{DateTime, Utc};
use fleetlink_common::{Device, DeviceAttributes};
use tracing::{debug, info};

/// SQL implementation of the device repository
#[derive(Debug, Clone)]
pub struct SqlDeviceRepository {
    db_client: DbClient,
}

impl SqlDeviceRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl DeviceRepository for SqlDeviceRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing device schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS devices (
                device_id TEXT PRIMARY KEY NOT NULL,
                name TEXT,
                os_version TEXT,
                phone_number TEXT,
                battery_level INTEGER,
                last_seen INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Device schema initialized successfully");
        Ok(())
    }

    async fn register_or_touch(
        &self,
        device_id: &str,
        attributes: &DeviceAttributes,
        now: DateTime<Utc>,
    ) -> Result<Device, DbError> {
        debug!("Registering device: {}", device_id);

        // A single upsert, so concurrent first registrations cannot race
        let query = format!(
            r#"
            INSERT INTO devices (device_id, name, os_version, phone_number, battery_level, last_seen, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(device_id) DO UPDATE SET
                name = excluded.name,
                os_version = excluded.os_version,
                phone_number = excluded.phone_number,
                battery_level = excluded.battery_level,
                last_seen = MAX(devices.last_seen, excluded.last_seen)
            RETURNING {DEVICE_COLUMNS}
            "#
        );

        let now_ms = to_millis(now);
        // `fetch_all` steps the statement to completion so the implicit
        // transaction ends before the connection returns to the pool.
        let rows = sqlx::query(&query)
            .bind(device_id.to_string())
            .bind(attributes.name.clone())
            .bind(attributes.os_version.clone())
            .bind(attributes.phone_number.clone())
            .bind(attributes.battery_level)
            .bind(now_ms)
            .bind(now_ms)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| DbError::QueryError("upsert returned no row".to_string()))?;
        device_from_row(row)
    }

    async fn get(&self, device_id: &str) -> Result<Option<Device>, DbError> {
        debug!("Finding device: {}", device_id);

        let query = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE device_id = $1");
        let rows = sqlx::query(&query)
            .bind(device_id.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.first().map(device_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Device>, DbError> {
        debug!("Listing all devices");

        let query =
            format!("SELECT {DEVICE_COLUMNS} FROM devices ORDER BY created_at ASC, device_id ASC");
        let rows = sqlx::query(&query)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.iter().map(device_from_row).collect()
    }

    async fn delete(&self, device_id: &str) -> Result<bool, DbError> {
        debug!("Deleting device and dependents: {}", device_id);

        // Write-first transaction: the write lock is held from the first
        // statement until commit, so no reader sees a partial cascade.
        let mut tx = self.db_client.begin().await?;

        sqlx::query("DELETE FROM commands WHERE device_id = $1")
            .bind(device_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        sqlx::query("DELETE FROM device_logs WHERE device_id = $1")
            .bind(device_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let removed = sqlx::query("DELETE FROM devices WHERE device_id = $1")
            .bind(device_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?
            .rows_affected();

        if removed == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Ok(false);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!("Device {} deleted", device_id);
        Ok(true)
    }

    async fn is_healthy(&self) -> bool {
        self.db_client.is_healthy().await
    }
}
