use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::upload::HttpTransport;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";
pub const IP_UNAVAILABLE: &str = "unavailable";
pub const IP_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct IpLookupResponse {
    ip: String,
}

/// Public IP lookup. Never fails: any problem yields [`IP_UNAVAILABLE`].
#[derive(Clone)]
pub struct NetworkIdentity {
    transport: Arc<dyn HttpTransport>,
    lookup_url: String,
}

impl NetworkIdentity {
    pub fn new(transport: Arc<dyn HttpTransport>, lookup_url: impl Into<String>) -> Self {
        Self {
            transport,
            lookup_url: lookup_url.into(),
        }
    }

    pub async fn collect_public_ip(&self) -> String {
        match self.lookup().await {
            Ok(ip) => {
                log_debug!("public ip resolved: {ip}");
                ip
            }
            Err(err) => {
                log_warn!("public ip lookup failed: {err:#}");
                IP_UNAVAILABLE.to_string()
            }
        }
    }

    async fn lookup(&self) -> Result<String> {
        // Enforced here as well as in the transport.
        let response = tokio::time::timeout(
            IP_LOOKUP_TIMEOUT,
            self.transport.get(&self.lookup_url, IP_LOOKUP_TIMEOUT),
        )
        .await
        .map_err(|_| anyhow!("timed out after {}s", IP_LOOKUP_TIMEOUT.as_secs()))??;

        if !response.is_ok() {
            bail!("lookup returned status {}", response.status);
        }

        let parsed: IpLookupResponse =
            serde_json::from_str(&response.body).context("malformed lookup response")?;
        let ip = parsed.ip.trim();
        if ip.is_empty() {
            bail!("lookup returned an empty ip");
        }
        Ok(ip.to_string())
    }
}
