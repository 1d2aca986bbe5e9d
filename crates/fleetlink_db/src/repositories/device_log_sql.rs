//! SQL implementation of the device log repository

use crate::convert::{json_to_text, log_from_row, to_millis, LOG_COLUMNS};
use crate::error::DbError;
use crate::repositories::device_log::DeviceLogRepository;
use crate::DbClient;
use chrono::{DateTime, Utc};
use fleetlink_common::DeviceLog;
use tracing::{debug, info};

/// SQL implementation of the device log repository
#[derive(Debug, Clone)]
pub struct SqlDeviceLogRepository {
    db_client: DbClient,
}

impl SqlDeviceLogRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl DeviceLogRepository for SqlDeviceLogRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing device log schema");

        let table = r#"
            CREATE TABLE IF NOT EXISTS device_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#;
        self.db_client.execute(table).await?;

        let index = "CREATE INDEX IF NOT EXISTS idx_device_logs_device ON device_logs (device_id, id)";
        self.db_client.execute(index).await?;

        info!("Device log schema initialized successfully");
        Ok(())
    }

    async fn append(
        &self,
        device_id: &str,
        kind: &str,
        payload: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<DeviceLog, DbError> {
        debug!("Appending '{}' log for device: {}", kind, device_id);

        let query = format!(
            r#"
            INSERT INTO device_logs (device_id, kind, payload, created_at)
            SELECT $1, $2, $3, $4
            WHERE EXISTS (SELECT 1 FROM devices WHERE device_id = $1)
            RETURNING {LOG_COLUMNS}
            "#
        );

        let rows = sqlx::query(&query)
            .bind(device_id.to_string())
            .bind(kind.to_string())
            .bind(json_to_text(payload)?)
            .bind(to_millis(now))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        match rows.first() {
            Some(row) => log_from_row(row),
            None => Err(DbError::DeviceNotFound(device_id.to_string())),
        }
    }

    async fn list_for_device(&self, device_id: &str) -> Result<Vec<DeviceLog>, DbError> {
        let query =
            format!("SELECT {LOG_COLUMNS} FROM device_logs WHERE device_id = $1 ORDER BY id ASC");
        let rows = sqlx::query(&query)
            .bind(device_id.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.iter().map(log_from_row).collect()
    }
}
