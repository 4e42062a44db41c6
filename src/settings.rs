use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::models::LocationSample;
use crate::signals::{DEFAULT_DEVICE_ID_PREFIX, DEFAULT_IP_LOOKUP_URL};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PLATFORM: &str = "mobile";
pub const BASE_URL_ENV: &str = "LIVENESS_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub base_url: String,
    pub ip_lookup_url: String,
    pub platform: String,
    pub device_id_prefix: String,
    /// Unset means the upload waits as long as the transport allows.
    pub upload_timeout_secs: Option<u64>,
    /// Clip served by the replay camera when no capture device exists.
    pub replay_video: Option<PathBuf>,
    /// Fixed position reported by the host location provider.
    pub location: Option<LocationSample>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.into(),
            platform: DEFAULT_PLATFORM.into(),
            device_id_prefix: DEFAULT_DEVICE_ID_PREFIX.into(),
            upload_timeout_secs: None,
            replay_video: None,
            location: None,
        }
    }
}

impl Settings {
    /// Reads `path`, falling back to defaults when the file is missing or
    /// unparseable. Only an unreadable existing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("ignoring invalid settings in {}: {err}", path.display());
                Settings::default()
            })
        } else {
            Settings::default()
        };

        settings.normalize();
        Ok(settings)
    }

    pub fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.base_url = base_url;
            }
        }
        self.normalize();
    }

    pub fn upload_timeout(&self) -> Option<Duration> {
        self.upload_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    fn normalize(&mut self) {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.base_url.is_empty() {
            self.base_url = DEFAULT_BASE_URL.into();
        }
        if self.platform.trim().is_empty() {
            self.platform = DEFAULT_PLATFORM.into();
        }
        if self.device_id_prefix.trim().is_empty() {
            self.device_id_prefix = DEFAULT_DEVICE_ID_PREFIX.into();
        }
    }
}
