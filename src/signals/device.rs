use chrono::{DateTime, Utc};

pub const DEFAULT_DEVICE_ID_PREFIX: &str = "device";

/// Synthetic per-run identifier: `{prefix}_{unix millis}`.
///
/// Two calls inside the same millisecond return the same id. Downstream only
/// uses it to name uploaded files, so that is tolerated.
pub fn collect_device_id(prefix: &str) -> String {
    device_id_at(prefix, Utc::now())
}

pub fn device_id_at(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", prefix, now.timestamp_millis())
}
