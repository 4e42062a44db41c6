use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use tokio::sync::Mutex;

use crate::models::CaptureArtifact;

use super::provider::{CameraProvider, DeviceDescriptor, Facing, ResolutionPreset, SessionHandle};
use super::state::{CaptureSession, CaptureState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Length of every liveness clip.
pub const RECORDING_DURATION: Duration = Duration::from_millis(2500);

/// Owns the camera. Every method absorbs provider faults; callers only ever
/// see a state or an optional artifact.
#[derive(Clone)]
pub struct CaptureController {
    provider: Arc<dyn CameraProvider>,
    session: Arc<Mutex<CaptureSession>>,
}

impl CaptureController {
    pub fn new(provider: Arc<dyn CameraProvider>) -> Self {
        Self {
            provider,
            session: Arc::new(Mutex::new(CaptureSession::new())),
        }
    }

    pub async fn state(&self) -> CaptureState {
        self.session.lock().await.state
    }

    pub async fn selected_device(&self) -> Option<DeviceDescriptor> {
        self.session.lock().await.device.clone()
    }

    /// Brings the camera to `Ready`, or leaves it `Failed` for a later retry.
    pub async fn initialize(&self) -> CaptureState {
        let mut session = self.session.lock().await;
        let state = session.state;
        match state {
            CaptureState::Ready | CaptureState::Recording | CaptureState::Disposed => state,
            _ => self.initialize_locked(&mut session).await,
        }
    }

    /// Records a [`RECORDING_DURATION`] clip. `None` on any fault or an empty file.
    pub async fn record_fixed_duration(&self) -> Option<CaptureArtifact> {
        let mut session = self.session.lock().await;

        if session.state == CaptureState::Disposed {
            log_warn!("recording requested after camera was disposed");
            return None;
        }

        if !session.can_record() && self.initialize_locked(&mut session).await != CaptureState::Ready {
            log_error!("camera not ready, cannot record");
            return None;
        }

        match self.record_locked(&mut session).await {
            Ok(artifact) => {
                log_info!(
                    "recorded {} ({} bytes)",
                    artifact.path().display(),
                    artifact.size_bytes()
                );
                Some(artifact)
            }
            Err(err) => {
                log_error!("video capture failed: {err:#}");
                None
            }
        }
    }

    /// Releases the camera session. Safe to call more than once.
    pub async fn dispose(&self) {
        let mut session = self.session.lock().await;
        if session.state == CaptureState::Disposed {
            log_debug!("camera already disposed");
            return;
        }

        if let Some(handle) = session.dispose() {
            self.provider.dispose(handle).await;
            log_info!("camera session {:?} disposed", handle);
        }
    }

    async fn initialize_locked(&self, session: &mut CaptureSession) -> CaptureState {
        session.begin_initializing();

        match self.open_preferred_device().await {
            Ok((device, handle)) => {
                log_info!("camera ready: {} ({:?})", device.name, device.facing);
                session.mark_ready(device, handle);
            }
            Err(err) => {
                log_error!("camera initialization failed: {err:#}");
                if let Some(stale) = session.fail() {
                    self.provider.dispose(stale).await;
                }
            }
        }

        session.state
    }

    async fn open_preferred_device(&self) -> Result<(DeviceDescriptor, SessionHandle)> {
        let devices = self
            .provider
            .list_devices()
            .await
            .context("failed to enumerate cameras")?;
        let device =
            select_device(&devices).ok_or_else(|| anyhow!("no camera devices available"))?;

        let handle = self
            .provider
            .open(&device, ResolutionPreset::Medium, true)
            .await
            .with_context(|| format!("failed to open camera {}", device.id))?;

        Ok((device, handle))
    }

    async fn record_locked(&self, session: &mut CaptureSession) -> Result<CaptureArtifact> {
        let handle = session
            .handle
            .ok_or_else(|| anyhow!("camera session missing"))?;

        if let Err(err) = self.provider.start_recording(handle).await {
            self.fail_session(session).await;
            return Err(err.context("failed to start recording"));
        }
        session.begin_recording(handle);
        log_debug!("recording started on {:?}", handle);

        tokio::time::sleep(RECORDING_DURATION).await;

        let path = match self.provider.stop_recording(handle).await {
            Ok(path) => path,
            Err(err) => {
                self.fail_session(session).await;
                return Err(err.context("failed to stop recording"));
            }
        };
        session.finish_recording();

        CaptureArtifact::from_path(path).await
    }

    async fn fail_session(&self, session: &mut CaptureSession) {
        if let Some(handle) = session.fail() {
            self.provider.dispose(handle).await;
        }
    }
}

/// First front-facing camera, else the first camera listed.
pub fn select_device(devices: &[DeviceDescriptor]) -> Option<DeviceDescriptor> {
    devices
        .iter()
        .find(|device| device.facing == Facing::Front)
        .or_else(|| devices.first())
        .cloned()
}
