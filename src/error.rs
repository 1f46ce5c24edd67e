use crate::variant::ApiVariant;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum WebthumbError {
    #[error("Unsupported format type '{0}'")]
    UnsupportedFormat(String),

    #[error("Unsupported render mode '{value}' for the {variant} API")]
    UnsupportedRenderMode { value: String, variant: ApiVariant },

    #[error("Target URL must not be empty")]
    EmptyTargetUrl,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid response from server: {0}")]
    Protocol(String),

    #[error("Capture did not finish within {timeout_secs} polls, try again later")]
    CaptureTimeout { timeout_secs: u64 },

    #[error("Cannot write thumbnail to file '{}': {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),
}

impl WebthumbError {
    pub fn transport(message: impl Into<String>) -> Self {
        WebthumbError::Transport(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        WebthumbError::Protocol(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            WebthumbError::UnsupportedFormat(_)
            | WebthumbError::UnsupportedRenderMode { .. }
            | WebthumbError::EmptyTargetUrl => ErrorCategory::Validation,
            WebthumbError::Network(_)
            | WebthumbError::Transport(_)
            | WebthumbError::InvalidUrl(_) => ErrorCategory::Transport,
            WebthumbError::Protocol(_) => ErrorCategory::Protocol,
            WebthumbError::CaptureTimeout { .. } => ErrorCategory::Timeout,
            WebthumbError::FileWrite { .. } | WebthumbError::Io(_) => ErrorCategory::FileWrite,
            WebthumbError::Cancelled => ErrorCategory::Cancelled,
            WebthumbError::Config(_) => ErrorCategory::Config,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let remediation = match self {
            WebthumbError::UnsupportedFormat(_) => "Use one of the supported formats: png, jpg, gif.",
            WebthumbError::UnsupportedRenderMode { variant, .. } => match variant {
                ApiVariant::Legacy => "Use a screen width of 1024, 1280, 1650 or 1920.",
                ApiVariant::Browser => "Use a browser engine of chrome, firefox or opera.",
            },
            WebthumbError::EmptyTargetUrl => "Pass the page to capture, e.g. --url https://example.com.",
            WebthumbError::Network(_) | WebthumbError::Transport(_) => {
                "Check connectivity/proxy/VPN and the API base URL, then retry."
            }
            WebthumbError::InvalidUrl(_) => {
                "Verify the API base URL (e.g., http://api.webthumbnail.org/)."
            }
            WebthumbError::Protocol(_) => {
                "The API answered with an unexpected status; check --base-url and --variant."
            }
            WebthumbError::CaptureTimeout { .. } => {
                "The capture is still queued; retry later or raise --timeout."
            }
            WebthumbError::FileWrite { .. } | WebthumbError::Io(_) => {
                "Check the output path exists and is writable."
            }
            WebthumbError::Cancelled => "The capture was cancelled before it finished.",
            WebthumbError::Config(_) => "Check the config file (TOML) and command-line flags.",
        };
        ErrorPayload::new(self.category(), self.to_string(), remediation)
    }
}

pub type Result<T> = std::result::Result<T, WebthumbError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Validation,
    Transport,
    Protocol,
    Timeout,
    FileWrite,
    Cancelled,
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
