use serde::{Deserialize, Serialize};

/// A position fix returned by the location provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
}

/// The `gps_location` object sent to the verification endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for GpsLocation {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl From<Option<LocationSample>> for GpsLocation {
    fn from(sample: Option<LocationSample>) -> Self {
        match sample {
            Some(sample) => Self {
                latitude: sample.latitude,
                longitude: sample.longitude,
            },
            None => Self::default(),
        }
    }
}

/// Body of the `data` multipart field. Keys are snake_case on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationPayload {
    pub device_id: String,
    pub is_compromised: bool,
    pub gps_location: GpsLocation,
    pub ip_address: String,
    pub timestamp: String,
    pub platform: String,
}

impl VerificationPayload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
