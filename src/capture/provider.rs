use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Facing {
    Front,
    Back,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    pub facing: Facing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionPreset {
    Low,
    Medium,
    High,
}

/// Opaque handle to an open camera session, issued by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

/// Camera driver. `stop_recording` returns the path of the finished file.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>>;

    async fn open(
        &self,
        device: &DeviceDescriptor,
        resolution: ResolutionPreset,
        audio: bool,
    ) -> Result<SessionHandle>;

    async fn start_recording(&self, session: SessionHandle) -> Result<()>;

    async fn stop_recording(&self, session: SessionHandle) -> Result<PathBuf>;

    async fn dispose(&self, session: SessionHandle);
}
