//! Heartbeat-derived device presence.
//!
//! Presence is a pure function of `now - last_seen` and is recomputed on
//! every query; it is never stored.

use chrono::{DateTime, Duration, Utc};
use fleetlink_common::{Device, DeviceWithPresence};

/// Default staleness threshold, in seconds.
pub const DEFAULT_ONLINE_THRESHOLD_SECS: u64 = 20;

/// Whether a device counts as online at `now`.
///
/// A `last_seen` later than `now` (a skewed caller clock) counts as online.
pub fn is_online(device: &Device, now: DateTime<Utc>, threshold: Duration) -> bool {
    now.signed_duration_since(device.last_seen) < threshold
}

/// Annotates device records with their presence under a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceEvaluator {
    threshold: Duration,
}

impl PresenceEvaluator {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Build from a threshold in whole seconds, saturating on overflow.
    pub fn from_secs(secs: u64) -> Self {
        Self::new(secs_to_duration(secs))
    }

    pub fn is_online(&self, device: &Device, now: DateTime<Utc>) -> bool {
        is_online(device, now, self.threshold)
    }

    pub fn evaluate(&self, device: Device, now: DateTime<Utc>) -> DeviceWithPresence {
        let online = self.is_online(&device, now);
        DeviceWithPresence { device, online }
    }
}

impl Default for PresenceEvaluator {
    fn default() -> Self {
        Self::from_secs(DEFAULT_ONLINE_THRESHOLD_SECS)
    }
}

pub(crate) fn secs_to_duration(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}
