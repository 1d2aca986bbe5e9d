//! SQL implementation of the command repository

use crate::convert::{command_from_row, json_to_text, to_millis, COMMAND_COLUMNS};
use crate::error::DbError;
use crate::repositories::command::CommandRepository;
use crate::DbClient;
use chrono::{DateTime, Duration, Utc};
use fleetlink_common::{Command, CommandStatus};
use sqlx::Row;
use tracing::{debug, info};

/// SQL implementation of the command repository
#[derive(Debug, Clone)]
pub struct SqlCommandRepository {
    db_client: DbClient,
}

impl SqlCommandRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl CommandRepository for SqlCommandRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing command schema");

        let table = r#"
            CREATE TABLE IF NOT EXISTS commands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                command_type TEXT NOT NULL,
                command_data TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                sent_at INTEGER,
                executed_at INTEGER
            )
        "#;
        self.db_client.execute(table).await?;

        let index = r#"
            CREATE INDEX IF NOT EXISTS idx_commands_device_status
            ON commands (device_id, status, id)
        "#;
        self.db_client.execute(index).await?;

        info!("Command schema initialized successfully");
        Ok(())
    }

    async fn enqueue(
        &self,
        device_id: &str,
        command_type: &str,
        command_data: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        debug!("Enqueueing '{}' for device: {}", command_type, device_id);

        // Existence check and insert are one statement, so a concurrent
        // cascade delete cannot slip in between them.
        let query = r#"
            INSERT INTO commands (device_id, command_type, command_data, status, created_at)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM devices WHERE device_id = $6)
            RETURNING id
        "#;

        let rows = sqlx::query(query)
            .bind(device_id.to_string())
            .bind(command_type.to_string())
            .bind(json_to_text(command_data)?)
            .bind(CommandStatus::Pending.as_str())
            .bind(to_millis(now))
            .bind(device_id.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        match rows.first() {
            Some(row) => Ok(row.try_get("id")?),
            None => Err(DbError::DeviceNotFound(device_id.to_string())),
        }
    }

    async fn claim_pending(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
        redelivery_after: Option<Duration>,
    ) -> Result<Vec<Command>, DbError> {
        debug!("Claiming commands for device: {}", device_id);

        // A cutoff before the representable range means nothing is old enough
        let cutoff = redelivery_after.and_then(|after| now.checked_sub_signed(after));
        let claimable = match cutoff {
            None => "status = $4",
            Some(_) => "(status = $4 OR (status = $5 AND sent_at <= $6))",
        };
        let query = format!(
            r#"
            UPDATE commands
            SET status = $1, sent_at = $2
            WHERE device_id = $3 AND {claimable}
            RETURNING {COMMAND_COLUMNS}
            "#
        );

        let mut statement = sqlx::query::<sqlx::Sqlite>(&query)
            .bind(CommandStatus::Sent.as_str())
            .bind(to_millis(now))
            .bind(device_id.to_string())
            .bind(CommandStatus::Pending.as_str());
        if let Some(cutoff) = cutoff {
            statement = statement
                .bind(CommandStatus::Sent.as_str())
                .bind(to_millis(cutoff));
        }

        // The UPDATE is the first statement, so this transaction holds the
        // write lock for its whole duration: the select-and-transition is a
        // single step and concurrent claims partition the claimable set.
        let mut tx = self.db_client.begin().await?;

        let rows = statement
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        if rows.is_empty() {
            let exists = !sqlx::query("SELECT 1 AS present FROM devices WHERE device_id = $1")
                .bind(device_id.to_string())
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?
                .is_empty();

            tx.commit()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;

            return if exists {
                Ok(Vec::new())
            } else {
                Err(DbError::DeviceNotFound(device_id.to_string()))
            };
        }

        let mut commands = rows
            .iter()
            .map(command_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        // RETURNING order is unspecified
        commands.sort_by_key(|c| c.command_id);
        info!(
            "Claimed {} command(s) for device {}",
            commands.len(),
            device_id
        );
        Ok(commands)
    }

    async fn acknowledge(&self, command_id: i64, now: DateTime<Utc>) -> Result<(), DbError> {
        debug!("Acknowledging command: {}", command_id);

        // COALESCE keeps the first execution time on a repeated ack
        let query = r#"
            UPDATE commands
            SET status = $1, executed_at = COALESCE(executed_at, $2)
            WHERE id = $3
        "#;

        let affected = sqlx::query(query)
            .bind(CommandStatus::Executed.as_str())
            .bind(to_millis(now))
            .bind(command_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?
            .rows_affected();

        if affected == 0 {
            return Err(DbError::CommandNotFound(command_id));
        }
        Ok(())
    }

    async fn get(&self, command_id: i64) -> Result<Option<Command>, DbError> {
        let query = format!("SELECT {COMMAND_COLUMNS} FROM commands WHERE id = $1");
        let rows = sqlx::query(&query)
            .bind(command_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.first().map(command_from_row).transpose()
    }

    async fn list_for_device(&self, device_id: &str) -> Result<Vec<Command>, DbError> {
        let query =
            format!("SELECT {COMMAND_COLUMNS} FROM commands WHERE device_id = $1 ORDER BY id ASC");
        let rows = sqlx::query(&query)
            .bind(device_id.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.iter().map(command_from_row).collect()
    }
}
