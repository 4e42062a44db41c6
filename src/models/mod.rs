mod artifact;
mod payload;

pub use artifact::{CaptureArtifact, VIDEO_CONTENT_TYPE};
pub use payload::{GpsLocation, LocationSample, VerificationPayload};
