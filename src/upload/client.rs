use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::models::{CaptureArtifact, VerificationPayload};

use super::transport::{FilePart, HttpTransport, MultipartForm};

pub const DATA_FIELD: &str = "data";
pub const VIDEO_FIELD: &str = "liveness_video";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTHY_STATUS: &str = "server_is_running";

/// Body of a 200 from `/verify`. Only `message` is guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationReceipt {
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub received_at: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub video_size: Option<u64>,
    #[serde(default)]
    pub video_saved_as: Option<String>,
    #[serde(default)]
    pub data_saved_as: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Success {
        message: String,
        receipt: VerificationReceipt,
    },
    /// 200 without a usable `message`.
    Malformed { body: String },
    Rejected { status: u16, body: String },
    Transport { message: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }

    pub fn classify(status: u16, body: String) -> Self {
        if status != 200 {
            return UploadOutcome::Rejected { status, body };
        }

        let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) else {
            return UploadOutcome::Malformed { body };
        };
        match VerificationReceipt::from_value(&value) {
            Some(receipt) => UploadOutcome::Success {
                message: receipt.message.clone(),
                receipt,
            },
            None => UploadOutcome::Malformed { body },
        }
    }
}

impl VerificationReceipt {
    /// Needs a string `message`; the other fields are kept only when they
    /// have the expected type.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let text = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);
        Some(Self {
            message: text("message")?,
            status: text("status"),
            received_at: text("received_at"),
            device_id: text("device_id"),
            video_size: value.get("video_size").and_then(|v| v.as_u64()),
            video_saved_as: text("video_saved_as"),
            data_saved_as: text("data_saved_as"),
        })
    }
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Single-shot client for the verification endpoint. Nothing is retried.
#[derive(Clone)]
pub struct UploadClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: Option<Duration>,
}

impl UploadClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn verify_url(&self) -> String {
        format!("{}/verify", self.base_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// `Err` only for local faults (payload or artifact unusable); every
    /// network or server problem is an [`UploadOutcome`].
    pub async fn send(
        &self,
        payload: &VerificationPayload,
        artifact: &CaptureArtifact,
    ) -> Result<UploadOutcome> {
        let data = payload.to_json().context("failed to serialize payload")?;
        let bytes = artifact.read_bytes().await?;
        let size = bytes.len();

        let form = MultipartForm::new().text(DATA_FIELD, data).file(FilePart {
            field: VIDEO_FIELD.to_string(),
            file_name: artifact.file_name(),
            content_type: artifact.content_type().to_string(),
            bytes,
        });

        let url = self.verify_url();
        info!("uploading {} bytes of video to {}", size, url);

        let outcome = match self.transport.post_multipart(&url, form, self.timeout).await {
            Ok(response) => UploadOutcome::classify(response.status, response.body),
            Err(err) => UploadOutcome::Transport {
                message: format!("{err:#}"),
            },
        };

        match &outcome {
            UploadOutcome::Success { message, .. } => info!("verification accepted: {message}"),
            UploadOutcome::Malformed { body } => warn!("verification response malformed: {body}"),
            UploadOutcome::Rejected { status, body } => {
                warn!("verification rejected with {status}: {body}")
            }
            UploadOutcome::Transport { message } => warn!("upload failed: {message}"),
        }

        Ok(outcome)
    }

    /// Pings `/health` so a sleeping server can spin up before the real upload.
    pub async fn check_health(&self) -> bool {
        let url = self.health_url();
        match self.transport.get(&url, HEALTH_TIMEOUT).await {
            Ok(response) if response.is_ok() => {
                match serde_json::from_str::<HealthResponse>(&response.body) {
                    Ok(health) if health.status == HEALTHY_STATUS => true,
                    _ => {
                        warn!("unexpected health response: {}", response.body);
                        false
                    }
                }
            }
            Ok(response) => {
                warn!("health check returned {}", response.status);
                false
            }
            Err(err) => {
                warn!("health check failed: {err:#}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GpsLocation;
    use crate::upload::testing::{Reply, StubTransport};
    use std::io::Write;

    fn payload() -> VerificationPayload {
        VerificationPayload {
            device_id: "device_1".into(),
            is_compromised: false,
            gps_location: GpsLocation::default(),
            ip_address: "unavailable".into(),
            timestamp: "2024-01-01T00:00:00.000Z".into(),
            platform: "mobile".into(),
        }
    }

    async fn artifact(dir: &tempfile::TempDir) -> CaptureArtifact {
        let path = dir.path().join("clip.mp4");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"fake mp4").unwrap();
        CaptureArtifact::from_path(path).await.unwrap()
    }

    fn client(post: Reply) -> (UploadClient, Arc<StubTransport>) {
        let transport = Arc::new(StubTransport::new(Reply::Fail("unused".into()), post));
        (
            UploadClient::new(transport.clone(), "http://verify.test/", None),
            transport,
        )
    }

    #[test]
    fn classifies_responses() {
        assert_eq!(
            UploadOutcome::classify(503, "server starting".into()),
            UploadOutcome::Rejected {
                status: 503,
                body: "server starting".into()
            }
        );
        assert_eq!(
            UploadOutcome::classify(200, r#"{"status":"received_ok"}"#.into()),
            UploadOutcome::Malformed {
                body: r#"{"status":"received_ok"}"#.into()
            }
        );
        assert!(matches!(
            UploadOutcome::classify(200, "not json".into()),
            UploadOutcome::Malformed { .. }
        ));
        assert!(UploadOutcome::classify(200, r#"{"message":"ok"}"#.into()).is_success());
        assert!(matches!(
            UploadOutcome::classify(200, r#"{"message":42}"#.into()),
            UploadOutcome::Malformed { .. }
        ));
    }

    #[test]
    fn odd_receipt_fields_do_not_hide_success() {
        match UploadOutcome::classify(200, r#"{"message":"ok","device_id":42}"#.into()) {
            UploadOutcome::Success { message, receipt } => {
                assert_eq!(message, "ok");
                assert_eq!(receipt.device_id, None);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        match UploadOutcome::classify(
            200,
            r#"{"message":"ok","video_size":-1,"status":"received_ok"}"#.into(),
        ) {
            UploadOutcome::Success { receipt, .. } => {
                assert_eq!(receipt.video_size, None);
                assert_eq!(receipt.status.as_deref(), Some("received_ok"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn builds_multipart_request() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir).await;
        let (client, transport) = client(Reply::Respond(200, r#"{"message":"ok"}"#.into()));

        let outcome = client.send(&payload(), &artifact).await.unwrap();
        assert!(outcome.is_success());

        let (url, form) = transport.last_post().unwrap();
        assert_eq!(url, "http://verify.test/verify");

        let data: VerificationPayload =
            serde_json::from_str(form.text_field(DATA_FIELD).unwrap()).unwrap();
        assert_eq!(data, payload());

        let video = form.file_part(VIDEO_FIELD).unwrap();
        assert_eq!(video.content_type, "video/mp4");
        assert_eq!(video.file_name, "clip.mp4");
        assert_eq!(video.bytes, b"fake mp4");
    }

    #[tokio::test]
    async fn parses_full_receipt() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir).await;
        let body = r#"{
            "status": "received_ok",
            "message": "Successfully received both JSON data and video file from mobile",
            "received_at": "2024-01-01T00:00:01",
            "device_id": "device_1",
            "video_size": 8,
            "video_saved_as": "mobile_liveness_device_1_20240101_000001.mp4",
            "data_saved_as": "device_data_device_1_20240101_000001.txt"
        }"#;
        let (client, _) = client(Reply::Respond(200, body.into()));

        match client.send(&payload(), &artifact).await.unwrap() {
            UploadOutcome::Success { receipt, .. } => {
                assert_eq!(receipt.status.as_deref(), Some("received_ok"));
                assert_eq!(receipt.video_size, Some(8));
                assert_eq!(receipt.device_id.as_deref(), Some("device_1"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_fault_is_an_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir).await;
        let (client, transport) = client(Reply::Fail("connection reset".into()));

        match client.send(&payload(), &artifact).await.unwrap() {
            UploadOutcome::Transport { message } => assert!(message.contains("connection reset")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(transport.post_count(), 1);
    }

    #[tokio::test]
    async fn vanished_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir).await;
        std::fs::remove_file(artifact.path()).unwrap();
        let (client, transport) = client(Reply::Respond(200, r#"{"message":"ok"}"#.into()));

        assert!(client.send(&payload(), &artifact).await.is_err());
        assert_eq!(transport.post_count(), 0);
    }

    #[tokio::test]
    async fn health_check_reads_status() {
        let transport = Arc::new(StubTransport::new(
            Reply::Respond(
                200,
                r#"{"status":"server_is_running","timestamp":"2024-01-01T00:00:00"}"#.into(),
            ),
            Reply::Fail("unused".into()),
        ));
        let client = UploadClient::new(transport.clone(), "http://verify.test", None);
        assert!(client.check_health().await);
        assert_eq!(
            transport.gets.lock().unwrap().as_slice(),
            ["http://verify.test/health".to_string()]
        );

        let transport = Arc::new(StubTransport::new(
            Reply::Respond(503, "starting".into()),
            Reply::Fail("unused".into()),
        ));
        let client = UploadClient::new(transport, "http://verify.test", None);
        assert!(!client.check_health().await);
    }
}
