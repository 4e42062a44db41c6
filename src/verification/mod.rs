pub mod builder;
pub mod controller;
pub mod state;

pub use builder::PayloadBuilder;
pub use controller::{VerificationController, VerificationDeps};
pub use state::{FailureKind, RunOutcome, RunPhase, RunStatus, COLD_START_HINT};
