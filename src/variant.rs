//! API variant policy.
//!
//! The capture API exists in two flavours that share one protocol but differ in
//! accepted thumbnail dimensions, in the axis used to pick a renderer and in the
//! recommended backoff between status checks. An [`ApiProfile`] bundles those
//! differences so the request builder and the session stay variant-agnostic.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const API_URL: &str = "http://api.webthumbnail.org/";

pub const LEGACY_MIN_WIDTH: u32 = 100;
pub const LEGACY_MAX_WIDTH: u32 = 500;
pub const LEGACY_MIN_HEIGHT: u32 = 100;
pub const LEGACY_MAX_HEIGHT: u32 = 500;

pub const BROWSER_MIN_WIDTH: u32 = 70;
pub const BROWSER_MAX_WIDTH: u32 = 2048;
pub const BROWSER_MIN_HEIGHT: u32 = 70;
pub const BROWSER_MAX_HEIGHT: u32 = 4096;

pub const LEGACY_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const BROWSER_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVariant {
    /// Viewport-width selector (`screen=`), small thumbnails.
    #[default]
    Legacy,
    /// Browser-engine selector (`browser=`), large thumbnails.
    Browser,
}

impl ApiVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVariant::Legacy => "legacy",
            ApiVariant::Browser => "browser",
        }
    }

    pub fn profile(&self) -> ApiProfile {
        ApiProfile::for_variant(*self)
    }
}

impl std::fmt::Display for ApiVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown API variant '{0}': expected legacy or browser")]
pub struct VariantParseError(pub String);

impl FromStr for ApiVariant {
    type Err = VariantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "screen" => Ok(ApiVariant::Legacy),
            "browser" => Ok(ApiVariant::Browser),
            _ => Err(VariantParseError(s.to_string())),
        }
    }
}

/// Which query parameter selects the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderAxis {
    Screen,
    Browser,
}

impl RenderAxis {
    pub fn query_key(&self) -> &'static str {
        match self {
            RenderAxis::Screen => "screen",
            RenderAxis::Browser => "browser",
        }
    }
}

/// Closed range a thumbnail dimension is saturated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionRange {
    pub min: u32,
    pub max: u32,
}

impl DimensionRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: i64) -> u32 {
        // min/max are u32, so the clamped value always fits.
        value.clamp(i64::from(self.min), i64::from(self.max)) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiProfile {
    pub variant: ApiVariant,
    pub base_url: String,
    pub width: DimensionRange,
    pub height: DimensionRange,
    pub render_axis: RenderAxis,
    pub poll_interval: Duration,
}

impl ApiProfile {
    pub fn for_variant(variant: ApiVariant) -> Self {
        match variant {
            ApiVariant::Legacy => Self {
                variant,
                base_url: API_URL.to_string(),
                width: DimensionRange::new(LEGACY_MIN_WIDTH, LEGACY_MAX_WIDTH),
                height: DimensionRange::new(LEGACY_MIN_HEIGHT, LEGACY_MAX_HEIGHT),
                render_axis: RenderAxis::Screen,
                poll_interval: LEGACY_POLL_INTERVAL,
            },
            ApiVariant::Browser => Self {
                variant,
                base_url: API_URL.to_string(),
                width: DimensionRange::new(BROWSER_MIN_WIDTH, BROWSER_MAX_WIDTH),
                height: DimensionRange::new(BROWSER_MIN_HEIGHT, BROWSER_MAX_HEIGHT),
                render_axis: RenderAxis::Browser,
                poll_interval: BROWSER_POLL_INTERVAL,
            },
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for ApiProfile {
    fn default() -> Self {
        Self::for_variant(ApiVariant::default())
    }
}
