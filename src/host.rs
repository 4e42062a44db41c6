//! Capabilities for running the pipeline on a desktop host, where there is no
//! consent UI, no GPS and usually no camera. Mobile shells provide their own
//! implementations of the same traits.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::{
    capture::ReplayCamera,
    models::LocationSample,
    permissions::{Capability, CapabilityProvider, PermissionState},
    settings::Settings,
    signals::{LocationAccuracy, LocationProvider, StubIntegrityCheck},
    upload::HttpTransport,
    verification::VerificationDeps,
};

/// Grants everything except location, which is only granted when a fixed
/// position is configured.
pub struct HostPermissions {
    location_available: bool,
}

impl HostPermissions {
    pub fn new(location_available: bool) -> Self {
        Self { location_available }
    }

    fn state_for(&self, capability: Capability) -> PermissionState {
        match capability {
            Capability::Location if !self.location_available => PermissionState::PermanentlyDenied,
            _ => PermissionState::Granted,
        }
    }
}

#[async_trait]
impl CapabilityProvider for HostPermissions {
    async fn request_permissions(
        &self,
        capabilities: &[Capability],
    ) -> Result<BTreeMap<Capability, PermissionState>> {
        Ok(capabilities
            .iter()
            .map(|capability| (*capability, self.state_for(*capability)))
            .collect())
    }

    async fn check_location_permission(&self) -> Result<PermissionState> {
        Ok(self.state_for(Capability::Location))
    }

    async fn request_location_permission(&self) -> Result<PermissionState> {
        Ok(self.state_for(Capability::Location))
    }
}

pub struct StaticLocation {
    sample: Option<LocationSample>,
}

impl StaticLocation {
    pub fn new(sample: Option<LocationSample>) -> Self {
        Self { sample }
    }
}

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn current_position(&self, _accuracy: LocationAccuracy) -> Result<LocationSample> {
        self.sample
            .ok_or_else(|| anyhow!("no location configured on this host"))
    }
}

pub fn host_deps(
    settings: &Settings,
    video: PathBuf,
    transport: Arc<dyn HttpTransport>,
) -> VerificationDeps {
    VerificationDeps {
        permissions: Arc::new(HostPermissions::new(settings.location.is_some())),
        location: Arc::new(StaticLocation::new(settings.location)),
        camera: Arc::new(ReplayCamera::new(video)),
        transport,
        integrity: Arc::new(StubIntegrityCheck),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::GeoLocator;

    #[tokio::test]
    async fn location_follows_configuration() {
        let without = HostPermissions::new(false);
        assert_eq!(
            without.check_location_permission().await.unwrap(),
            PermissionState::PermanentlyDenied
        );
        let grants = without.request_permissions(&Capability::ALL).await.unwrap();
        assert!(grants[&Capability::Camera].is_granted());
        assert!(!grants[&Capability::Location].is_granted());

        let fix = LocationSample {
            latitude: 48.85,
            longitude: 2.35,
        };
        let locator = GeoLocator::new(
            Arc::new(HostPermissions::new(true)),
            Arc::new(StaticLocation::new(Some(fix))),
        );
        assert_eq!(locator.collect_location().await, Some(fix));
    }
}
