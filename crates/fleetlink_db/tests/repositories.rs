use chrono::{DateTime, Duration, TimeZone, Utc};
use fleetlink_common::{CommandStatus, DeviceAttributes};
use fleetlink_db::{
    CommandRepository, DbClient, DbError, DeviceLogRepository, DeviceRepository,
    FleetRepositories, FleetRepositoryFactory, RepositoryFactory,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

// A file-backed database: every pooled connection must see the same data,
// which an in-memory SQLite database would not give us.
fn db_url(dir: &TempDir) -> String {
    format!("sqlite:{}", dir.path().join("fleet.db").display())
}

async fn setup() -> (TempDir, FleetRepositories) {
    let dir = tempfile::tempdir().unwrap();
    let url = db_url(&dir);
    let client = DbClient::from_url(&url).await.unwrap();
    let repositories = FleetRepositoryFactory::new().create_repository(client);
    repositories.init_schema().await.unwrap();
    (dir, repositories)
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn named(name: &str) -> DeviceAttributes {
    DeviceAttributes {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn register_creates_then_refreshes() {
    let (_dir, repos) = setup().await;

    let first = repos
        .devices
        .register_or_touch("phone-1", &named("Pixel"), t0())
        .await
        .unwrap();
    assert_eq!(first.created_at, t0());
    assert_eq!(first.last_seen, t0());

    let later = t0() + Duration::seconds(30);
    let attributes = DeviceAttributes {
        name: Some("Pixel 8".into()),
        battery_level: Some(64),
        ..Default::default()
    };
    let second = repos
        .devices
        .register_or_touch("phone-1", &attributes, later)
        .await
        .unwrap();

    assert_eq!(second.created_at, t0());
    assert_eq!(second.last_seen, later);
    assert_eq!(second.attributes, attributes);
    assert_eq!(repos.devices.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn last_seen_never_moves_backwards() {
    let (_dir, repos) = setup().await;
    let later = t0() + Duration::seconds(60);

    repos
        .devices
        .register_or_touch("phone-1", &named("a"), later)
        .await
        .unwrap();
    let device = repos
        .devices
        .register_or_touch("phone-1", &named("b"), t0())
        .await
        .unwrap();

    assert_eq!(device.last_seen, later);
    assert_eq!(device.attributes.name.as_deref(), Some("b"));
}

#[tokio::test]
async fn enqueue_requires_a_registered_device() {
    let (_dir, repos) = setup().await;

    let err = repos
        .commands
        .enqueue("ghost", "ring", &json!({}), t0())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::DeviceNotFound(id) if id == "ghost"));

    let err = repos
        .commands
        .claim_pending("ghost", t0(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::DeviceNotFound(_)));
}

#[tokio::test]
async fn claim_returns_pending_commands_in_id_order_exactly_once() {
    let (_dir, repos) = setup().await;
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();

    let mut ids = Vec::new();
    for kind in ["ring", "vibrate", "locate"] {
        ids.push(
            repos
                .commands
                .enqueue("phone-1", kind, &json!({ "kind": kind }), t0())
                .await
                .unwrap(),
        );
    }
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let claimed_at = t0() + Duration::seconds(5);
    let claimed = repos
        .commands
        .claim_pending("phone-1", claimed_at, None)
        .await
        .unwrap();

    assert_eq!(
        claimed.iter().map(|c| c.command_id).collect::<Vec<_>>(),
        ids
    );
    assert!(claimed.iter().all(|c| c.status == CommandStatus::Sent));
    assert!(claimed.iter().all(|c| c.sent_at == Some(claimed_at)));
    assert_eq!(claimed[1].command_data, json!({ "kind": "vibrate" }));

    let again = repos
        .commands
        .claim_pending("phone-1", claimed_at, None)
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn claims_do_not_cross_devices() {
    let (_dir, repos) = setup().await;
    for id in ["phone-1", "phone-2"] {
        repos
            .devices
            .register_or_touch(id, &named(id), t0())
            .await
            .unwrap();
    }
    repos
        .commands
        .enqueue("phone-2", "ring", &json!(null), t0())
        .await
        .unwrap();

    let claimed = repos
        .commands
        .claim_pending("phone-1", t0(), None)
        .await
        .unwrap();
    assert!(claimed.is_empty());

    let claimed = repos
        .commands
        .claim_pending("phone-2", t0(), None)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_partition_the_queue() {
    let (_dir, repos) = setup().await;
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();

    let mut enqueued = HashSet::new();
    for n in 0..20 {
        enqueued.insert(
            repos
                .commands
                .enqueue("phone-1", "ping", &json!({ "n": n }), t0())
                .await
                .unwrap(),
        );
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let commands = repos.commands.clone();
        handles.push(tokio::spawn(async move {
            commands.claim_pending("phone-1", t0(), None).await
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for command in handle.await.unwrap().unwrap() {
            assert!(seen.insert(command.command_id), "command claimed twice");
        }
    }
    assert_eq!(seen, enqueued);
}

#[tokio::test]
async fn acknowledge_is_unconditional_and_idempotent() {
    let (_dir, repos) = setup().await;
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();
    let id = repos
        .commands
        .enqueue("phone-1", "ring", &json!({}), t0())
        .await
        .unwrap();

    // A pending command may be acknowledged without ever being claimed
    let first_ack = t0() + Duration::seconds(1);
    repos.commands.acknowledge(id, first_ack).await.unwrap();
    repos
        .commands
        .acknowledge(id, first_ack + Duration::seconds(10))
        .await
        .unwrap();

    let command = repos.commands.get(id).await.unwrap().unwrap();
    assert_eq!(command.status, CommandStatus::Executed);
    assert_eq!(command.executed_at, Some(first_ack));
    assert_eq!(command.sent_at, None);

    let claimed = repos
        .commands
        .claim_pending("phone-1", t0(), None)
        .await
        .unwrap();
    assert!(claimed.is_empty());

    let err = repos.commands.acknowledge(id + 100, t0()).await.unwrap_err();
    assert!(matches!(err, DbError::CommandNotFound(missing) if missing == id + 100));
}

#[tokio::test]
async fn redelivery_reclaims_stale_sent_commands_only_when_enabled() {
    let (_dir, repos) = setup().await;
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();
    let id = repos
        .commands
        .enqueue("phone-1", "ring", &json!({}), t0())
        .await
        .unwrap();
    repos
        .commands
        .claim_pending("phone-1", t0(), None)
        .await
        .unwrap();

    let later = t0() + Duration::seconds(120);
    let without = repos
        .commands
        .claim_pending("phone-1", later, None)
        .await
        .unwrap();
    assert!(without.is_empty());

    let too_soon = repos
        .commands
        .claim_pending("phone-1", t0() + Duration::seconds(30), Some(Duration::seconds(60)))
        .await
        .unwrap();
    assert!(too_soon.is_empty());

    let redelivered = repos
        .commands
        .claim_pending("phone-1", later, Some(Duration::seconds(60)))
        .await
        .unwrap();
    assert_eq!(redelivered.len(), 1);
    assert_eq!(redelivered[0].command_id, id);
    assert_eq!(redelivered[0].sent_at, Some(later));

    repos.commands.acknowledge(id, later).await.unwrap();
    let after_ack = repos
        .commands
        .claim_pending("phone-1", later + Duration::seconds(600), Some(Duration::seconds(60)))
        .await
        .unwrap();
    assert!(after_ack.is_empty());
}

#[tokio::test]
async fn logs_append_in_order_and_require_a_device() {
    let (_dir, repos) = setup().await;
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();

    let sms = repos
        .logs
        .append("phone-1", "sms", &json!({ "from": "+100", "body": "hi" }), t0())
        .await
        .unwrap();
    let form = repos
        .logs
        .append("phone-1", "form", &json!({ "field": 1 }), t0())
        .await
        .unwrap();
    assert!(sms.log_id < form.log_id);
    assert_eq!(sms.payload["body"], "hi");

    let logs = repos.logs.list_for_device("phone-1").await.unwrap();
    assert_eq!(
        logs.iter().map(|l| l.kind.as_str()).collect::<Vec<_>>(),
        vec!["sms", "form"]
    );

    let err = repos
        .logs
        .append("ghost", "sms", &json!({}), t0())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::DeviceNotFound(_)));
}

#[tokio::test]
async fn delete_cascades_to_commands_and_logs() {
    let (_dir, repos) = setup().await;
    for id in ["phone-1", "phone-2"] {
        repos
            .devices
            .register_or_touch(id, &named(id), t0())
            .await
            .unwrap();
    }
    let doomed = repos
        .commands
        .enqueue("phone-1", "wipe", &json!({}), t0())
        .await
        .unwrap();
    let kept = repos
        .commands
        .enqueue("phone-2", "ring", &json!({}), t0())
        .await
        .unwrap();
    repos
        .logs
        .append("phone-1", "sms", &json!({}), t0())
        .await
        .unwrap();

    assert!(repos.devices.delete("phone-1").await.unwrap());

    assert!(repos.devices.get("phone-1").await.unwrap().is_none());
    assert!(repos.commands.get(doomed).await.unwrap().is_none());
    assert!(repos.commands.list_for_device("phone-1").await.unwrap().is_empty());
    assert!(repos.logs.list_for_device("phone-1").await.unwrap().is_empty());
    assert!(repos.commands.get(kept).await.unwrap().is_some());

    assert!(!repos.devices.delete("phone-1").await.unwrap());
}

#[tokio::test]
async fn reregistering_after_delete_starts_fresh() {
    let (_dir, repos) = setup().await;
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();
    repos
        .commands
        .enqueue("phone-1", "ring", &json!({}), t0())
        .await
        .unwrap();
    repos.devices.delete("phone-1").await.unwrap();

    let later = t0() + Duration::seconds(90);
    let device = repos
        .devices
        .register_or_touch("phone-1", &named("a"), later)
        .await
        .unwrap();
    assert_eq!(device.created_at, later);
    assert!(repos
        .commands
        .claim_pending("phone-1", later, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn schema_init_is_repeatable() {
    let (_dir, repos) = setup().await;
    repos.init_schema().await.unwrap();
}

#[tokio::test]
async fn absent_attributes_and_timestamps_decode_as_none() {
    let (_dir, repos) = setup().await;

    let device = repos
        .devices
        .register_or_touch("phone-1", &DeviceAttributes::default(), t0())
        .await
        .unwrap();
    assert_eq!(device.attributes, DeviceAttributes::default());

    let id = repos
        .commands
        .enqueue("phone-1", "ring", &json!({}), t0())
        .await
        .unwrap();
    let pending = repos.commands.get(id).await.unwrap().unwrap();
    assert_eq!(pending.sent_at, None);
    assert_eq!(pending.executed_at, None);

    let claimed = repos
        .commands
        .claim_pending("phone-1", t0(), None)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].executed_at, None);
}

#[tokio::test]
async fn timestamps_read_back_exactly() {
    let (_dir, repos) = setup().await;
    let seen = t0() + Duration::milliseconds(987);

    let device = repos
        .devices
        .register_or_touch("phone-1", &named("a"), seen)
        .await
        .unwrap();
    assert_eq!(device.last_seen, seen);

    let stored = repos.devices.get("phone-1").await.unwrap().unwrap();
    assert_eq!(stored.last_seen, seen);
    assert_eq!(stored.created_at, seen);

    let now = Utc::now();
    let device = repos
        .devices
        .register_or_touch("phone-1", &named("a"), now)
        .await
        .unwrap();
    assert_eq!(device.last_seen.timestamp_millis(), now.timestamp_millis());
}

#[tokio::test]
async fn writes_are_visible_to_a_separate_pool() {
    let (dir, repos) = setup().await;
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();
    let id = repos
        .commands
        .enqueue("phone-1", "ring", &json!({ "n": 1 }), t0())
        .await
        .unwrap();
    repos
        .logs
        .append("phone-1", "sms", &json!({}), t0())
        .await
        .unwrap();

    let other = FleetRepositoryFactory::new()
        .create_repository(DbClient::from_url(&db_url(&dir)).await.unwrap());

    let device = other.devices.get("phone-1").await.unwrap().unwrap();
    assert_eq!(device.last_seen, t0());
    assert_eq!(other.commands.get(id).await.unwrap().unwrap().command_id, id);
    assert_eq!(other.logs.list_for_device("phone-1").await.unwrap().len(), 1);

    let claimed = other
        .commands
        .claim_pending("phone-1", t0(), None)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(
        repos.commands.get(id).await.unwrap().unwrap().status,
        CommandStatus::Sent
    );
}

#[tokio::test]
async fn unrepresentable_redelivery_cutoff_never_redelivers() {
    let (_dir, repos) = setup().await;
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();
    repos
        .commands
        .enqueue("phone-1", "ring", &json!({}), t0())
        .await
        .unwrap();
    let first = repos
        .commands
        .claim_pending("phone-1", t0(), Some(Duration::MAX))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let again = repos
        .commands
        .claim_pending(
            "phone-1",
            t0() + Duration::days(365),
            Some(Duration::MAX),
        )
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_racing_enqueue_and_claim_leaves_no_orphans() {
    let (_dir, repos) = setup().await;
    let repos = Arc::new(repos);
    repos
        .devices
        .register_or_touch("phone-1", &named("a"), t0())
        .await
        .unwrap();

    let enqueuer = {
        let repos = Arc::clone(&repos);
        tokio::spawn(async move {
            let mut ids = Vec::new();
            for n in 0..500 {
                match repos
                    .commands
                    .enqueue("phone-1", "ping", &json!({ "n": n }), t0())
                    .await
                {
                    Ok(id) => ids.push(id),
                    Err(DbError::DeviceNotFound(_)) => break,
                    Err(e) => panic!("enqueue failed: {e}"),
                }
                tokio::task::yield_now().await;
            }
            ids
        })
    };

    let claimers: Vec<_> = (0..3)
        .map(|_| {
            let repos = Arc::clone(&repos);
            tokio::spawn(async move {
                let mut claimed = Vec::new();
                loop {
                    match repos.commands.claim_pending("phone-1", t0(), None).await {
                        Ok(batch) => claimed.extend(batch.into_iter().map(|c| c.command_id)),
                        Err(DbError::DeviceNotFound(_)) => break,
                        Err(e) => panic!("claim failed: {e}"),
                    }
                    tokio::task::yield_now().await;
                }
                claimed
            })
        })
        .collect();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(repos.devices.delete("phone-1").await.unwrap());

    let enqueued: HashSet<i64> = enqueuer.await.unwrap().into_iter().collect();
    let mut delivered = HashSet::new();
    for claimer in claimers {
        for id in claimer.await.unwrap() {
            assert!(delivered.insert(id), "command {id} delivered twice");
            assert!(enqueued.contains(&id));
        }
    }

    assert!(repos.commands.list_for_device("phone-1").await.unwrap().is_empty());
    for id in &enqueued {
        assert!(repos.commands.get(*id).await.unwrap().is_none());
    }
    let err = repos
        .commands
        .enqueue("phone-1", "ping", &json!({}), t0())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::DeviceNotFound(_)));
}
