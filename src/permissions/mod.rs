use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Camera,
    Microphone,
    Location,
    Storage,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Camera,
        Capability::Microphone,
        Capability::Location,
        Capability::Storage,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// The user opted out of future prompts; re-requesting is pointless.
    PermanentlyDenied,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

/// Host permission mechanism. Requesting may show the platform consent UI.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn request_permissions(
        &self,
        capabilities: &[Capability],
    ) -> Result<BTreeMap<Capability, PermissionState>>;

    async fn check_location_permission(&self) -> Result<PermissionState>;

    async fn request_location_permission(&self) -> Result<PermissionState>;
}

/// Requests permissions up front. A denial is not an error here; whichever
/// component needs the capability deals with its absence.
#[derive(Clone)]
pub struct CapabilityGate {
    provider: Arc<dyn CapabilityProvider>,
}

impl CapabilityGate {
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        Self { provider }
    }

    pub async fn request_all(
        &self,
        capabilities: &[Capability],
    ) -> BTreeMap<Capability, PermissionState> {
        let mut grants = match self.provider.request_permissions(capabilities).await {
            Ok(grants) => grants,
            Err(err) => {
                warn!("permission request failed, treating all as denied: {err:#}");
                BTreeMap::new()
            }
        };

        // Anything the provider did not answer for counts as denied.
        for capability in capabilities {
            grants.entry(*capability).or_insert(PermissionState::Denied);
        }

        for (capability, state) in &grants {
            if state.is_granted() {
                info!("permission {:?} granted", capability);
            } else {
                warn!("permission {:?} not granted ({:?})", capability, state);
            }
        }

        grants
    }
}
