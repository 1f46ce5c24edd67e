//! Submit / poll / fetch orchestration.
//!
//! A capture is three kinds of GET against the same endpoint: the capture URL
//! schedules the job, the status URL reports progress, and once the job has
//! finished the capture URL returns the image itself.

use crate::error::{Result, WebthumbError};
use crate::request::CaptureRequest;
use crate::transport::{CaptureResult, HttpTransport, RequestContext};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Progress of a remote capture job as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Finished,
    Pending,
}

impl JobStatus {
    /// Map a status body. `None` means the server answered something unknown.
    pub fn from_body(body: &str) -> Option<Self> {
        match body.trim() {
            "finished" => Some(JobStatus::Finished),
            "waiting" | "pending" | "loaded" => Some(JobStatus::Pending),
            _ => None,
        }
    }
}

/// Lifecycle of a single `capture` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureState {
    Idle,
    Submitted,
    Polling,
    Finished,
    TimedOut,
    ProtocolError,
    Cancelled,
}

/// What to do when the initial submit call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitPolicy {
    /// Log and carry on; the failure resurfaces at the next poll or fetch.
    #[default]
    Discard,
    /// Return the submit error immediately.
    Propagate,
}

pub type StateCallback = Arc<dyn Fn(CaptureState) + Send + Sync>;

pub struct CaptureSession<T> {
    transport: T,
    context: RequestContext,
    submit_policy: SubmitPolicy,
    poll_interval: Option<Duration>,
    cancel: CancellationToken,
    on_state: Option<StateCallback>,
}

impl<T: HttpTransport> CaptureSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            context: RequestContext::default(),
            submit_policy: SubmitPolicy::default(),
            poll_interval: None,
            cancel: CancellationToken::new(),
            on_state: None,
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_submit_policy(mut self, policy: SubmitPolicy) -> Self {
        self.submit_policy = policy;
        self
    }

    /// Override the backoff between status checks. Defaults to the interval
    /// of the request's API variant.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn on_state(mut self, callback: StateCallback) -> Self {
        self.on_state = Some(callback);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn submit(&self, request: &CaptureRequest) -> Result<CaptureResult> {
        let url = request.capture_url();
        self.transport.get(&url, &self.context).await
    }

    pub async fn poll_status(&self, request: &CaptureRequest) -> Result<JobStatus> {
        let url = request.status_url();
        let response = self.transport.get(&url, &self.context).await?;
        let body = response.text();
        JobStatus::from_body(&body).ok_or_else(|| WebthumbError::protocol(describe_status_body(&body, 64)))
    }

    /// Run the full protocol and return the final fetch response.
    ///
    /// With `wait` the status endpoint is polled until it reports `finished`.
    /// Every pending answer costs one backoff interval and one unit of
    /// `request.timeout_secs()`; once that budget is spent the capture fails
    /// with [`WebthumbError::CaptureTimeout`].
    pub async fn capture(&self, request: &CaptureRequest, wait: bool) -> Result<CaptureResult> {
        self.emit(CaptureState::Idle);

        if let Err(err) = self.submit(request).await {
            match self.submit_policy {
                SubmitPolicy::Discard => {
                    warn!(error = %err, url = request.target_url(), "initial submit failed");
                }
                SubmitPolicy::Propagate => return Err(err),
            }
        }
        self.emit(CaptureState::Submitted);

        if wait {
            self.emit(CaptureState::Polling);
            self.wait_until_finished(request).await?;
        }

        self.emit(CaptureState::Finished);
        self.submit(request).await
    }

    async fn wait_until_finished(&self, request: &CaptureRequest) -> Result<()> {
        let interval = self
            .poll_interval
            .unwrap_or(request.profile().poll_interval);
        let mut elapsed: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                self.emit(CaptureState::Cancelled);
                return Err(WebthumbError::Cancelled);
            }

            let status = match self.poll_status(request).await {
                Ok(status) => status,
                Err(err @ WebthumbError::Protocol(_)) => {
                    self.emit(CaptureState::ProtocolError);
                    return Err(err);
                }
                Err(err) => return Err(err),
            };

            if status == JobStatus::Finished {
                return Ok(());
            }

            if elapsed >= request.timeout_secs() {
                self.emit(CaptureState::TimedOut);
                return Err(WebthumbError::CaptureTimeout {
                    timeout_secs: request.timeout_secs(),
                });
            }
            elapsed += 1;
            debug!(elapsed, timeout = request.timeout_secs(), "capture pending");

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.emit(CaptureState::Cancelled);
                    return Err(WebthumbError::Cancelled);
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Capture and write the image body to `path`.
    pub async fn capture_to_file(
        &self,
        request: &CaptureRequest,
        path: impl AsRef<Path>,
        wait: bool,
    ) -> Result<CaptureResult> {
        let result = self.capture(request, wait).await?;
        let path = path.as_ref();
        tokio::fs::write(path, &result.body)
            .await
            .map_err(|source| WebthumbError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), bytes = result.body.len(), "thumbnail written");
        Ok(result)
    }

    /// Capture and stream the image body into `writer`. The returned result
    /// carries the content type and length for the caller's response headers.
    pub async fn capture_to_writer<W>(
        &self,
        request: &CaptureRequest,
        writer: &mut W,
        wait: bool,
    ) -> Result<CaptureResult>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self.capture(request, wait).await?;
        writer.write_all(&result.body).await?;
        writer.flush().await?;
        Ok(result)
    }

    fn emit(&self, state: CaptureState) {
        if let Some(callback) = &self.on_state {
            callback(state);
        }
    }
}

fn describe_status_body(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "empty status body".to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    if trimmed.chars().count() > max_chars {
        out.push('…');
    }
    format!("unexpected status '{out}'")
}
