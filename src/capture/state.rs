use serde::{Deserialize, Serialize};

use super::provider::{DeviceDescriptor, SessionHandle};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CaptureState {
    Uninitialized,
    Initializing,
    Ready,
    Recording,
    Failed,
    Disposed,
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Uninitialized
    }
}

/// Camera lifecycle owned by `CaptureController`.
#[derive(Debug, Default)]
pub struct CaptureSession {
    pub state: CaptureState,
    pub device: Option<DeviceDescriptor>,
    pub handle: Option<SessionHandle>,
    /// Set between a successful start and the matching stop.
    pub recording: Option<SessionHandle>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_record(&self) -> bool {
        self.state == CaptureState::Ready && self.handle.is_some()
    }

    pub fn begin_initializing(&mut self) {
        self.state = CaptureState::Initializing;
    }

    pub fn mark_ready(&mut self, device: DeviceDescriptor, handle: SessionHandle) {
        self.device = Some(device);
        self.handle = Some(handle);
        self.recording = None;
        self.state = CaptureState::Ready;
    }

    pub fn begin_recording(&mut self, handle: SessionHandle) {
        self.recording = Some(handle);
        self.state = CaptureState::Recording;
    }

    pub fn finish_recording(&mut self) {
        self.recording = None;
        self.state = CaptureState::Ready;
    }

    /// Drops the session handle; the caller disposes it with the provider.
    pub fn fail(&mut self) -> Option<SessionHandle> {
        self.state = CaptureState::Failed;
        self.recording = None;
        self.handle.take()
    }

    pub fn dispose(&mut self) -> Option<SessionHandle> {
        self.state = CaptureState::Disposed;
        self.recording = None;
        self.device = None;
        self.handle.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::provider::Facing;

    fn front() -> DeviceDescriptor {
        DeviceDescriptor {
            id: "0".into(),
            name: "front".into(),
            facing: Facing::Front,
        }
    }

    #[test]
    fn recording_requires_ready() {
        let mut session = CaptureSession::new();
        assert!(!session.can_record());

        session.begin_initializing();
        assert!(!session.can_record());

        session.mark_ready(front(), SessionHandle(1));
        assert!(session.can_record());

        session.begin_recording(SessionHandle(1));
        assert_eq!(session.state, CaptureState::Recording);
        assert!(!session.can_record());

        session.finish_recording();
        assert_eq!(session.state, CaptureState::Ready);
        assert!(session.recording.is_none());
    }

    #[test]
    fn failure_releases_handle() {
        let mut session = CaptureSession::new();
        session.mark_ready(front(), SessionHandle(7));
        assert_eq!(session.fail(), Some(SessionHandle(7)));
        assert_eq!(session.state, CaptureState::Failed);
        assert!(!session.can_record());
    }
}
