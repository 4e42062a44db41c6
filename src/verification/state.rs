use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::upload::VerificationReceipt;

pub const COLD_START_HINT: &str =
    "The verification server may need a moment to wake up; try again in a few seconds.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RunPhase {
    Idle,
    Collecting,
    Recording,
    Uploading,
    Succeeded,
    Failed,
}

impl Default for RunPhase {
    fn default() -> Self {
        RunPhase::Idle
    }
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Succeeded | RunPhase::Failed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    CaptureFailed,
    Rejected,
    Malformed,
    Transport,
    Unexpected,
    Cancelled,
}

/// What observers see. Written only by the verification controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub phase: RunPhase,
    pub message: String,
    pub run_id: Option<String>,
    pub failure: Option<FailureKind>,
    pub updated_at: DateTime<Utc>,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::idle()
    }
}

impl RunStatus {
    pub fn idle() -> Self {
        Self {
            phase: RunPhase::Idle,
            message: "Ready".to_string(),
            run_id: None,
            failure: None,
            updated_at: Utc::now(),
        }
    }

    pub fn phase(run_id: &str, phase: RunPhase) -> Self {
        let message = match phase {
            RunPhase::Idle => "Ready",
            RunPhase::Collecting => "Collecting device data...",
            RunPhase::Recording => "Recording liveness video...",
            RunPhase::Uploading => "Uploading to verification server...",
            RunPhase::Succeeded => "✅ Success",
            RunPhase::Failed => "❌ Failed",
        };
        Self {
            phase,
            message: message.to_string(),
            run_id: Some(run_id.to_string()),
            failure: None,
            updated_at: Utc::now(),
        }
    }

    pub fn terminal(run_id: &str, outcome: &RunOutcome) -> Self {
        let (phase, failure) = match outcome {
            RunOutcome::Success { .. } => (RunPhase::Succeeded, None),
            RunOutcome::Failure { kind, .. } => (RunPhase::Failed, Some(*kind)),
        };
        Self {
            phase,
            message: outcome.message(),
            run_id: Some(run_id.to_string()),
            failure,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success {
        message: String,
        receipt: VerificationReceipt,
    },
    Failure {
        kind: FailureKind,
        detail: String,
    },
}

impl RunOutcome {
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        RunOutcome::Failure {
            kind,
            detail: detail.into(),
        }
    }

    /// Non-200 answer from the verification server.
    pub fn rejected(status: u16, body: &str) -> Self {
        Self::failure(FailureKind::Rejected, format!("({status}): {body}"))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    /// Single human-readable line for the status display.
    pub fn message(&self) -> String {
        match self {
            RunOutcome::Success { message, .. } => format!("✅ Success: {message}"),
            RunOutcome::Failure { kind, detail } => match kind {
                FailureKind::CaptureFailed => "❌ video capture failed".to_string(),
                FailureKind::Rejected => format!("❌ Upload failed {detail}"),
                FailureKind::Malformed => format!("❌ Unexpected server response: {detail}"),
                FailureKind::Transport => format!("❌ Network error: {detail}"),
                FailureKind::Unexpected => format!("❌ Error: {detail}. {COLD_START_HINT}"),
                FailureKind::Cancelled => "❌ Verification cancelled".to_string(),
            },
        }
    }
}
