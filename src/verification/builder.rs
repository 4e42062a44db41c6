use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::{GpsLocation, LocationSample, VerificationPayload};

/// Assembles the request body. Deterministic apart from the build timestamp.
pub struct PayloadBuilder;

impl PayloadBuilder {
    pub fn build(
        device_id: &str,
        compromised: bool,
        location: Option<LocationSample>,
        ip_address: &str,
        platform: &str,
    ) -> VerificationPayload {
        Self::build_at(device_id, compromised, location, ip_address, platform, Utc::now())
    }

    pub fn build_at(
        device_id: &str,
        compromised: bool,
        location: Option<LocationSample>,
        ip_address: &str,
        platform: &str,
        built_at: DateTime<Utc>,
    ) -> VerificationPayload {
        VerificationPayload {
            device_id: device_id.to_string(),
            is_compromised: compromised,
            gps_location: GpsLocation::from(location),
            ip_address: ip_address.to_string(),
            timestamp: built_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            platform: platform.to_string(),
        }
    }
}
