use std::{path::PathBuf, sync::Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tempfile::TempDir;

use super::provider::{CameraProvider, DeviceDescriptor, Facing, ResolutionPreset, SessionHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    List,
    Open,
    Start,
    Stop,
}

#[derive(Default)]
struct Counters {
    fault: Option<Fault>,
    opened_with: Option<(ResolutionPreset, bool)>,
    sessions_opened: u64,
    recordings_started: usize,
    disposed: usize,
}

/// In-memory camera that writes a fixed clip to a temp dir on stop.
pub struct FakeCamera {
    clip: Vec<u8>,
    devices: Vec<DeviceDescriptor>,
    dir: TempDir,
    discard_clip: bool,
    counters: Mutex<Counters>,
}

impl FakeCamera {
    pub fn with_clip(clip: &[u8]) -> Self {
        Self {
            clip: clip.to_vec(),
            devices: vec![
                DeviceDescriptor {
                    id: "back-0".into(),
                    name: "Back Camera".into(),
                    facing: Facing::Back,
                },
                DeviceDescriptor {
                    id: "front-1".into(),
                    name: "Front Camera".into(),
                    facing: Facing::Front,
                },
            ],
            dir: tempfile::tempdir().expect("temp dir"),
            discard_clip: false,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn failing(self, fault: Fault) -> Self {
        self.counters.lock().unwrap().fault = Some(fault);
        self
    }

    pub fn without_devices(mut self) -> Self {
        self.devices.clear();
        self
    }

    /// Deletes each clip on the blocking pool right after handing it out.
    /// With a single blocking thread the deletion lands after the caller's
    /// first file operation on the clip and before its second.
    pub fn discarding_clip(mut self) -> Self {
        self.discard_clip = true;
        self
    }

    pub fn clear_fault(&self) {
        self.counters.lock().unwrap().fault = None;
    }

    pub fn opened_with(&self) -> Option<(ResolutionPreset, bool)> {
        self.counters.lock().unwrap().opened_with
    }

    pub fn sessions_opened(&self) -> u64 {
        self.counters.lock().unwrap().sessions_opened
    }

    pub fn recordings_started(&self) -> usize {
        self.counters.lock().unwrap().recordings_started
    }

    pub fn disposed_sessions(&self) -> usize {
        self.counters.lock().unwrap().disposed
    }

    fn check(&self, step: Fault) -> Result<()> {
        match self.counters.lock().unwrap().fault {
            Some(fault) if fault == step => Err(anyhow!("camera fault during {:?}", step)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CameraProvider for FakeCamera {
    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        self.check(Fault::List)?;
        Ok(self.devices.clone())
    }

    async fn open(
        &self,
        _device: &DeviceDescriptor,
        resolution: ResolutionPreset,
        audio: bool,
    ) -> Result<SessionHandle> {
        self.check(Fault::Open)?;
        let mut counters = self.counters.lock().unwrap();
        counters.sessions_opened += 1;
        counters.opened_with = Some((resolution, audio));
        Ok(SessionHandle(counters.sessions_opened))
    }

    async fn start_recording(&self, _session: SessionHandle) -> Result<()> {
        self.check(Fault::Start)?;
        self.counters.lock().unwrap().recordings_started += 1;
        Ok(())
    }

    async fn stop_recording(&self, session: SessionHandle) -> Result<PathBuf> {
        self.check(Fault::Stop)?;
        let path = self.dir.path().join(format!("clip_{}.mp4", session.0));
        std::fs::write(&path, &self.clip)?;
        if self.discard_clip {
            let doomed = path.clone();
            tokio::spawn(async move {
                let _ = tokio::task::spawn_blocking(move || std::fs::remove_file(doomed)).await;
            });
        }
        Ok(path)
    }

    async fn dispose(&self, _session: SessionHandle) {
        self.counters.lock().unwrap().disposed += 1;
    }
}
