use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Named text fields plus named binary parts.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub text_fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text_fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.text_fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn file_part(&self, name: &str) -> Option<&FilePart> {
        self.files.iter().find(|part| part.field == name)
    }
}

/// Minimal HTTP surface the pipeline needs. An `Err` means the request never
/// produced a response (timeout, DNS, connection reset); any status code,
/// including 5xx, comes back as `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse>;

    async fn post_multipart(
        &self,
        url: &str,
        form: MultipartForm,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("liveness-check/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read body of GET {url}"))?;
        Ok(HttpResponse { status, body })
    }

    async fn post_multipart(
        &self,
        url: &str,
        form: MultipartForm,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse> {
        let mut multipart_form = multipart::Form::new();
        for (name, value) in form.text_fields {
            multipart_form = multipart_form.text(name, value);
        }
        for file in form.files {
            let part = multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .with_context(|| format!("invalid content type '{}'", file.content_type))?;
            multipart_form = multipart_form.part(file.field, part);
        }

        let mut request = self.client.post(url).multipart(multipart_form);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read body of POST {url}"))?;
        Ok(HttpResponse { status, body })
    }
}
