use std::{
    collections::HashSet,
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::provider::{CameraProvider, DeviceDescriptor, Facing, ResolutionPreset, SessionHandle};

/// Camera for hosts without a capture device: every recording yields a
/// pre-recorded clip from disk.
pub struct ReplayCamera {
    source: PathBuf,
    next_session: AtomicU64,
    open_sessions: Mutex<HashSet<SessionHandle>>,
    recording: Mutex<Option<SessionHandle>>,
}

impl ReplayCamera {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            next_session: AtomicU64::new(1),
            open_sessions: Mutex::new(HashSet::new()),
            recording: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CameraProvider for ReplayCamera {
    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(vec![DeviceDescriptor {
            id: "replay-0".into(),
            name: format!("Replay ({})", self.source.display()),
            facing: Facing::Front,
        }])
    }

    async fn open(
        &self,
        device: &DeviceDescriptor,
        resolution: ResolutionPreset,
        audio: bool,
    ) -> Result<SessionHandle> {
        tokio::fs::metadata(&self.source)
            .await
            .with_context(|| format!("replay clip {} not readable", self.source.display()))?;

        let handle = SessionHandle(self.next_session.fetch_add(1, Ordering::SeqCst));
        self.open_sessions.lock().await.insert(handle);
        log::debug!(
            "replay camera {} opened as {:?} ({:?}, audio={})",
            device.id,
            handle,
            resolution,
            audio
        );
        Ok(handle)
    }

    async fn start_recording(&self, session: SessionHandle) -> Result<()> {
        if !self.open_sessions.lock().await.contains(&session) {
            bail!("session {:?} is not open", session);
        }
        let mut recording = self.recording.lock().await;
        if recording.is_some() {
            bail!("recording already active");
        }
        *recording = Some(session);
        Ok(())
    }

    async fn stop_recording(&self, session: SessionHandle) -> Result<PathBuf> {
        let mut recording = self.recording.lock().await;
        if *recording != Some(session) {
            bail!("session {:?} is not recording", session);
        }
        *recording = None;
        Ok(self.source.clone())
    }

    async fn dispose(&self, session: SessionHandle) {
        self.open_sessions.lock().await.remove(&session);
        let mut recording = self.recording.lock().await;
        if *recording == Some(session) {
            *recording = None;
        }
    }
}
