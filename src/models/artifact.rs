use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
const FALLBACK_FILE_NAME: &str = "liveness_video.mp4";

/// A finished recording that has passed existence and non-empty checks.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureArtifact {
    path: PathBuf,
    size_bytes: u64,
}

impl CaptureArtifact {
    /// Validates the media file at `path` and wraps it.
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("recording not found at {}", path.display()))?;

        if !metadata.is_file() {
            bail!("recording at {} is not a file", path.display());
        }
        if metadata.len() == 0 {
            bail!("recording at {} is empty", path.display());
        }

        Ok(Self {
            path,
            size_bytes: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn content_type(&self) -> &'static str {
        VIDEO_CONTENT_TYPE
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILE_NAME)
            .to_string()
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read recording {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn accepts_non_empty_file() {
        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        file.write_all(b"\x00\x00\x00\x18ftypmp42").unwrap();

        let artifact = CaptureArtifact::from_path(file.path()).await.unwrap();
        assert_eq!(artifact.size_bytes(), 12);
        assert_eq!(artifact.content_type(), "video/mp4");
        assert!(artifact.file_name().ends_with(".mp4"));
        assert_eq!(artifact.read_bytes().await.unwrap().len(), 12);
    }

    #[tokio::test]
    async fn rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = CaptureArtifact::from_path(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.mp4");
        assert!(CaptureArtifact::from_path(missing).await.is_err());
    }
}
