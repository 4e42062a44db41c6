pub mod device;
pub mod integrity;
pub mod location;
pub mod network;

use std::sync::Arc;

use crate::models::LocationSample;

pub use device::{collect_device_id, DEFAULT_DEVICE_ID_PREFIX};
pub use integrity::{IntegrityCheck, StubIntegrityCheck};
pub use location::{GeoLocator, LocationAccuracy, LocationProvider};
pub use network::{NetworkIdentity, DEFAULT_IP_LOOKUP_URL, IP_UNAVAILABLE};

/// Everything gathered during the Collecting stage of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedSignals {
    pub device_id: String,
    pub is_compromised: bool,
    pub location: Option<LocationSample>,
    pub ip_address: String,
}

/// Runs the independent signal lookups. None of them can fail the run.
#[derive(Clone)]
pub struct SignalCollector {
    device_id_prefix: String,
    integrity: Arc<dyn IntegrityCheck>,
    locator: GeoLocator,
    network: NetworkIdentity,
}

impl SignalCollector {
    pub fn new(
        device_id_prefix: impl Into<String>,
        integrity: Arc<dyn IntegrityCheck>,
        locator: GeoLocator,
        network: NetworkIdentity,
    ) -> Self {
        Self {
            device_id_prefix: device_id_prefix.into(),
            integrity,
            locator,
            network,
        }
    }

    pub async fn collect_all(&self) -> CollectedSignals {
        let device_id = collect_device_id(&self.device_id_prefix);

        let (is_compromised, location, ip_address) = tokio::join!(
            self.integrity.is_compromised(),
            self.locator.collect_location(),
            self.network.collect_public_ip(),
        );

        log::info!(
            "signals collected: device_id={}, compromised={}, location={}, ip={}",
            device_id,
            is_compromised,
            if location.is_some() { "fix" } else { "absent" },
            ip_address
        );

        CollectedSignals {
            device_id,
            is_compromised,
            location,
            ip_address,
        }
    }
}
