//! HTTP transport used by the capture session.
//!
//! The session only needs "GET this URL and hand me the body plus a few
//! headers", so that is the whole [`HttpTransport`] surface. [`ReqwestTransport`]
//! is the production implementation; tests substitute scripted transports.

use crate::error::{Result, WebthumbError};
use futures::future::BoxFuture;
use reqwest::header::{CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFERER: &str = "-";
const CLIENT_NAME: &str = "Webthumbnail.org Client Rust";

/// One HTTP response from the API. A fresh value is produced for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub body: Vec<u8>,
    pub status_code: u16,
    pub content_type: String,
    pub content_length: u64,
}

impl CaptureResult {
    pub fn new(body: impl Into<Vec<u8>>, status_code: u16, content_type: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            content_length: body.len() as u64,
            body,
            status_code,
            content_type: content_type.into(),
        }
    }

    /// Body as text, used for status responses.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Caller-supplied request metadata, sent as `Referer` and `User-Agent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Referer forwarded from the caller's own inbound request, if any.
    pub referer: Option<String>,
    /// Software hosting the client (e.g. a web server banner).
    pub host_software: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_host_software(mut self, software: impl Into<String>) -> Self {
        self.host_software = Some(software.into());
        self
    }

    pub fn referer(&self) -> &str {
        self.referer
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REFERER)
    }

    pub fn user_agent(&self) -> String {
        let mut agent = format!("{CLIENT_NAME}/{}", env!("CARGO_PKG_VERSION"));
        if let Some(software) = self.host_software.as_deref().filter(|s| !s.is_empty()) {
            agent.push(' ');
            agent.push_str(software);
        }
        agent
    }
}

pub trait HttpTransport: Send + Sync {
    fn get<'a>(
        &'a self,
        url: &'a str,
        context: &'a RequestContext,
    ) -> BoxFuture<'a, Result<CaptureResult>>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    fn get<'a>(
        &'a self,
        url: &'a str,
        context: &'a RequestContext,
    ) -> BoxFuture<'a, Result<CaptureResult>> {
        (**self).get(url, context)
    }
}

/// reqwest-backed transport. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebthumbError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    pub fn from_client(http: Client) -> Self {
        Self { http }
    }

    async fn fetch(&self, url: &str, context: &RequestContext) -> Result<CaptureResult> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .header(REFERER, context.referer())
            .header(USER_AGENT, context.user_agent())
            .send()
            .await
            .map_err(WebthumbError::Network)?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_default();
        let header_length = response.content_length();

        let body = response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(WebthumbError::Network)?;

        if body.is_empty() {
            return Err(WebthumbError::transport(format!(
                "empty response from {url} (status {status_code})"
            )));
        }

        debug!(status_code, bytes = body.len(), %content_type, "response received");

        Ok(CaptureResult {
            content_length: header_length.unwrap_or(body.len() as u64),
            body,
            status_code,
            content_type,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
        context: &'a RequestContext,
    ) -> BoxFuture<'a, Result<CaptureResult>> {
        Box::pin(self.fetch(url, context))
    }
}
