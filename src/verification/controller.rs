use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    capture::{CameraProvider, CaptureController, CaptureState},
    permissions::{Capability, CapabilityGate, CapabilityProvider, PermissionState},
    settings::Settings,
    signals::{
        GeoLocator, IntegrityCheck, LocationProvider, NetworkIdentity, SignalCollector,
    },
    upload::{HttpTransport, UploadClient, UploadOutcome},
};

use super::{
    builder::PayloadBuilder,
    state::{FailureKind, RunOutcome, RunPhase, RunStatus},
};

/// Host-side capabilities the pipeline is wired to.
#[derive(Clone)]
pub struct VerificationDeps {
    pub permissions: Arc<dyn CapabilityProvider>,
    pub location: Arc<dyn LocationProvider>,
    pub camera: Arc<dyn CameraProvider>,
    pub transport: Arc<dyn HttpTransport>,
    pub integrity: Arc<dyn IntegrityCheck>,
}

/// Drives one verification run at a time: signals, capture, payload, upload.
#[derive(Clone)]
pub struct VerificationController {
    gate: CapabilityGate,
    signals: SignalCollector,
    capture: CaptureController,
    uploader: UploadClient,
    platform: String,
    status_tx: Arc<watch::Sender<RunStatus>>,
    busy: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

/// Clears the busy flag when a run ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl VerificationController {
    pub fn new(deps: VerificationDeps, settings: &Settings) -> Self {
        let locator = GeoLocator::new(deps.permissions.clone(), deps.location);
        let network = NetworkIdentity::new(deps.transport.clone(), settings.ip_lookup_url.clone());
        let signals = SignalCollector::new(
            settings.device_id_prefix.clone(),
            deps.integrity,
            locator,
            network,
        );

        Self::from_parts(
            CapabilityGate::new(deps.permissions),
            signals,
            CaptureController::new(deps.camera),
            UploadClient::new(deps.transport, &settings.base_url, settings.upload_timeout()),
            settings.platform.clone(),
        )
    }

    pub fn from_parts(
        gate: CapabilityGate,
        signals: SignalCollector,
        capture: CaptureController,
        uploader: UploadClient,
        platform: impl Into<String>,
    ) -> Self {
        let (status_tx, _) = watch::channel(RunStatus::idle());
        Self {
            gate,
            signals,
            capture,
            uploader,
            platform: platform.into(),
            status_tx: Arc::new(status_tx),
            busy: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> RunStatus {
        self.status_tx.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Asks for every permission up front and warms the camera.
    pub async fn prepare(&self) -> BTreeMap<Capability, PermissionState> {
        let grants = self.gate.request_all(&Capability::ALL).await;
        let camera_state = self.capture.initialize().await;
        if camera_state != CaptureState::Ready {
            warn!("camera not ready after prepare ({:?}); will retry on record", camera_state);
        }
        grants
    }

    pub async fn warm_up(&self) -> bool {
        let healthy = self.uploader.check_health().await;
        info!("verification server health: {}", if healthy { "up" } else { "down" });
        healthy
    }

    /// Runs the pipeline once. Rejected with `Err` if a run is already in
    /// flight; otherwise always ends in a terminal status.
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let _guard = BusyGuard::acquire(&self.busy)
            .ok_or_else(|| anyhow!("verification already in progress"))?;

        let run_id = Uuid::new_v4().to_string();
        info!("verification run {run_id} started");

        let outcome = match self.execute(&run_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("verification run {run_id} failed unexpectedly: {err:#}");
                RunOutcome::failure(FailureKind::Unexpected, format!("{err:#}"))
            }
        };

        self.publish(RunStatus::terminal(&run_id, &outcome));
        info!("verification run {run_id} finished: {}", outcome.message());
        Ok(outcome)
    }

    /// Cancels any in-flight run at its next stage boundary and releases the camera.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.capture.dispose().await;
    }

    async fn execute(&self, run_id: &str) -> Result<RunOutcome> {
        if self.shutdown.is_cancelled() {
            return Ok(cancelled());
        }

        self.publish(RunStatus::phase(run_id, RunPhase::Collecting));
        let signals = self.signals.collect_all().await;

        if self.shutdown.is_cancelled() {
            return Ok(cancelled());
        }

        self.publish(RunStatus::phase(run_id, RunPhase::Recording));
        let Some(artifact) = self.capture.record_fixed_duration().await else {
            return Ok(RunOutcome::failure(
                FailureKind::CaptureFailed,
                "video capture failed",
            ));
        };

        let payload = PayloadBuilder::build(
            &signals.device_id,
            signals.is_compromised,
            signals.location,
            &signals.ip_address,
            &self.platform,
        );

        if self.shutdown.is_cancelled() {
            return Ok(cancelled());
        }

        self.publish(RunStatus::phase(run_id, RunPhase::Uploading));
        let upload = tokio::select! {
            result = self.uploader.send(&payload, &artifact) => result?,
            _ = self.shutdown.cancelled() => return Ok(cancelled()),
        };

        Ok(match upload {
            UploadOutcome::Success { message, receipt } => RunOutcome::Success { message, receipt },
            UploadOutcome::Rejected { status, body } => RunOutcome::rejected(status, &body),
            UploadOutcome::Malformed { body } => RunOutcome::failure(FailureKind::Malformed, body),
            UploadOutcome::Transport { message } => {
                RunOutcome::failure(FailureKind::Transport, message)
            }
        })
    }

    fn publish(&self, status: RunStatus) {
        info!("status: {}", status.message);
        self.status_tx.send_replace(status);
    }
}

fn cancelled() -> RunOutcome {
    RunOutcome::failure(FailureKind::Cancelled, "verification cancelled")
}
