//! Webthumb Library
//!
//! A client for the webthumbnail.org screenshot API. The remote service renders
//! pages in real browsers; this crate builds the query URLs, submits capture
//! jobs, polls until they finish and hands back the image bytes.
//!
//! # Module Overview
//!
//! - [`variant`] - API variants and their dimension ranges / render axis
//! - [`request`] - Capture parameters and URL construction
//! - [`transport`] - HTTP transport trait and the reqwest implementation
//! - [`session`] - Submit / poll / fetch state machine
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use webthumb_lib::{ApiVariant, CaptureRequest, CaptureSession, ReqwestTransport};
//!
//! # async fn example() -> webthumb_lib::Result<()> {
//! let request = CaptureRequest::new("http://webthumbnail.org", ApiVariant::Legacy)?
//!     .with_width(320)
//!     .with_height(240)
//!     .with_render_mode("1280")?;
//!
//! let session = CaptureSession::new(ReqwestTransport::new()?);
//! session.capture_to_file(&request, "thumb.png", true).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod request;
pub mod session;
pub mod transport;
pub mod variant;

pub use config::{Config, ConfigError, HttpConfig, PollConfig};
pub use error::{ErrorCategory, ErrorPayload, Result, WebthumbError};
pub use output::{
    CaptureOutput, ErrorOutput, RequestDescriptor, StatusOutput, UrlOutput, WebthumbOutput,
    OUTPUT_VERSION,
};
pub use request::{
    BrowserEngine, CaptureRequest, ImageFormat, RenderMode, ScreenWidth, UrlEncoding,
};
pub use session::{CaptureSession, CaptureState, JobStatus, StateCallback, SubmitPolicy};
pub use transport::{
    CaptureResult, HttpTransport, ReqwestTransport, RequestContext, DEFAULT_REQUEST_TIMEOUT,
};
pub use variant::{
    ApiProfile, ApiVariant, DimensionRange, RenderAxis, API_URL, DEFAULT_TIMEOUT_SECS,
};

pub use tokio_util::sync::CancellationToken;
