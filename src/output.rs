use crate::error::ErrorPayload;
use crate::request::CaptureRequest;
use crate::transport::CaptureResult;
use crate::variant::ApiVariant;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version for output payloads.
pub const OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum WebthumbOutput {
    Capture(CaptureOutput),
    Url(UrlOutput),
    Status(StatusOutput),
    Error(ErrorOutput),
}

/// Request parameters as sent to the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    pub target: String,
    pub variant: ApiVariant,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub render_mode: String,
    pub timeout: u64,
}

impl From<&CaptureRequest> for RequestDescriptor {
    fn from(request: &CaptureRequest) -> Self {
        Self {
            target: request.target_url().to_string(),
            variant: request.profile().variant,
            width: request.width(),
            height: request.height(),
            format: request.format().as_str().to_string(),
            render_mode: request.render_mode().query_value(),
            timeout: request.timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutput {
    pub version: String,
    pub request: RequestDescriptor,
    pub capture_url: String,
    pub status_code: u16,
    pub content_type: String,
    pub content_length: u64,
    pub waited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl CaptureOutput {
    pub fn new(
        request: &CaptureRequest,
        result: &CaptureResult,
        waited: bool,
        output_path: Option<PathBuf>,
    ) -> Self {
        Self {
            version: OUTPUT_VERSION.to_string(),
            request: request.into(),
            capture_url: request.capture_url(),
            status_code: result.status_code,
            content_type: result.content_type.clone(),
            content_length: result.content_length,
            waited,
            output_path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlOutput {
    pub version: String,
    pub request: RequestDescriptor,
    pub capture_url: String,
    pub status_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    pub version: String,
    pub request: RequestDescriptor,
    pub status_url: String,
    pub finished: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}
