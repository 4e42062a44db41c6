pub mod controller;
pub mod provider;
pub mod replay;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{select_device, CaptureController, RECORDING_DURATION};
pub use provider::{CameraProvider, DeviceDescriptor, Facing, ResolutionPreset, SessionHandle};
pub use replay::ReplayCamera;
pub use state::{CaptureSession, CaptureState};
