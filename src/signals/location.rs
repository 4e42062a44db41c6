use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::LocationSample;
use crate::permissions::{CapabilityProvider, PermissionState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationAccuracy {
    Low,
    Medium,
    High,
}

/// Geolocation sensor. Implementations apply their own fix timeout.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, accuracy: LocationAccuracy) -> Result<LocationSample>;
}

/// Best-effort position lookup; `None` covers denial, no fix and provider faults.
#[derive(Clone)]
pub struct GeoLocator {
    permissions: Arc<dyn CapabilityProvider>,
    provider: Arc<dyn LocationProvider>,
}

impl GeoLocator {
    pub fn new(
        permissions: Arc<dyn CapabilityProvider>,
        provider: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            permissions,
            provider,
        }
    }

    pub async fn collect_location(&self) -> Option<LocationSample> {
        if !self.ensure_permission().await {
            return None;
        }

        match self.provider.current_position(LocationAccuracy::Medium).await {
            Ok(sample) => {
                log_debug!(
                    "location fix: lat={}, lon={}",
                    sample.latitude,
                    sample.longitude
                );
                Some(sample)
            }
            Err(err) => {
                log_warn!("location unavailable: {err:#}");
                None
            }
        }
    }

    async fn ensure_permission(&self) -> bool {
        let mut state = match self.permissions.check_location_permission().await {
            Ok(state) => state,
            Err(err) => {
                log_warn!("location permission check failed: {err:#}");
                return false;
            }
        };

        // Only a plain denial is worth asking again.
        if state == PermissionState::Denied {
            state = match self.permissions.request_location_permission().await {
                Ok(state) => state,
                Err(err) => {
                    log_warn!("location permission request failed: {err:#}");
                    return false;
                }
            };
        }

        if !state.is_granted() {
            log_info!("location permission {:?}, continuing without a fix", state);
        }
        state.is_granted()
    }
}
