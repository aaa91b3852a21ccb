//! HTTP transport to printer control APIs

use async_trait::async_trait;
use serde_json::Value;

use crate::{Error, Result};

/// Header carrying the device credential
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Raw answer from a printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

/// Sends authenticated requests to printers
///
/// Non-2xx answers are replies, not errors. Errors mean the exchange itself
/// failed (connection refused, reset, unreadable body).
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body, or an empty body when `body` is `None`
    async fn post(&self, url: &str, api_key: &str, body: Option<&Value>) -> Result<Reply>;

    /// POST `content` as the `file` field of a multipart form
    async fn upload(
        &self,
        url: &str,
        api_key: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<Reply>;
}

/// Transport backed by a shared, pooled `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing client, e.g. one with custom timeouts
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn finish(response: reqwest::Response) -> Result<Reply> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, bytes = body.len(), "received device response");
        Ok(Reply { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, api_key: &str, body: Option<&Value>) -> Result<Reply> {
        let mut request = self.client.post(url).header(API_KEY_HEADER, api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "device request failed");
            e
        })?;

        Self::finish(response).await
    }

    async fn upload(
        &self,
        url: &str,
        api_key: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<Reply> {
        let part = reqwest::multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| Error::Transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url, error = %e, "device upload failed");
                e
            })?;

        Self::finish(response).await
    }
}
