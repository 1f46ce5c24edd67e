//! Capture parameters and API URL construction.
//!
//! [`CaptureRequest`] is a plain value built up with `with_*` methods. Nothing
//! here touches the network; the session turns the rendered URLs into calls.

use crate::error::{Result, WebthumbError};
use crate::variant::{ApiProfile, ApiVariant, RenderAxis, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
    Gif,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Gif => "gif",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = WebthumbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" => Ok(ImageFormat::Jpg),
            "gif" => Ok(ImageFormat::Gif),
            _ => Err(WebthumbError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Viewport width the legacy API renders the page at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenWidth {
    #[default]
    W1024,
    W1280,
    W1650,
    W1920,
}

impl ScreenWidth {
    pub const ALL: [ScreenWidth; 4] = [
        ScreenWidth::W1024,
        ScreenWidth::W1280,
        ScreenWidth::W1650,
        ScreenWidth::W1920,
    ];

    pub fn pixels(&self) -> u32 {
        match self {
            ScreenWidth::W1024 => 1024,
            ScreenWidth::W1280 => 1280,
            ScreenWidth::W1650 => 1650,
            ScreenWidth::W1920 => 1920,
        }
    }

    pub fn from_pixels(pixels: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.pixels() == pixels)
    }
}

/// Browser engine the browser-variant API renders the page with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserEngine {
    #[default]
    Chrome,
    Firefox,
    Opera,
}

impl BrowserEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserEngine::Chrome => "chrome",
            BrowserEngine::Firefox => "firefox",
            BrowserEngine::Opera => "opera",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Screen(ScreenWidth),
    Browser(BrowserEngine),
}

impl RenderMode {
    /// First enumerated value on the given axis.
    pub fn default_for(axis: RenderAxis) -> Self {
        match axis {
            RenderAxis::Screen => RenderMode::Screen(ScreenWidth::default()),
            RenderAxis::Browser => RenderMode::Browser(BrowserEngine::default()),
        }
    }

    /// Parse a raw selector against the axis of `variant`.
    pub fn parse_for(value: &str, axis: RenderAxis, variant: ApiVariant) -> Result<Self> {
        let unsupported = || WebthumbError::UnsupportedRenderMode {
            value: value.to_string(),
            variant,
        };
        match axis {
            RenderAxis::Screen => value
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(ScreenWidth::from_pixels)
                .map(RenderMode::Screen)
                .ok_or_else(unsupported),
            RenderAxis::Browser => match value.to_ascii_lowercase().as_str() {
                "chrome" => Ok(RenderMode::Browser(BrowserEngine::Chrome)),
                "firefox" => Ok(RenderMode::Browser(BrowserEngine::Firefox)),
                "opera" => Ok(RenderMode::Browser(BrowserEngine::Opera)),
                _ => Err(unsupported()),
            },
        }
    }

    pub fn axis(&self) -> RenderAxis {
        match self {
            RenderMode::Screen(_) => RenderAxis::Screen,
            RenderMode::Browser(_) => RenderAxis::Browser,
        }
    }

    pub fn query_value(&self) -> String {
        match self {
            RenderMode::Screen(width) => width.pixels().to_string(),
            RenderMode::Browser(engine) => engine.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.axis().query_key(), self.query_value())
    }
}

/// How the target URL is placed into the `url=` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlEncoding {
    /// Concatenated verbatim, as the API has always received it.
    #[default]
    Raw,
    /// `application/x-www-form-urlencoded`, safe for targets containing `&` or `?`.
    Percent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    target_url: String,
    profile: ApiProfile,
    width: u32,
    height: u32,
    format: ImageFormat,
    render_mode: RenderMode,
    timeout_secs: u64,
    encoding: UrlEncoding,
}

impl CaptureRequest {
    /// Create a request for `target_url` with every other field at its default:
    /// the smallest allowed dimensions, png, the first render mode of the
    /// variant and a 120 second timeout.
    pub fn new(target_url: impl Into<String>, variant: ApiVariant) -> Result<Self> {
        Self::with_profile(target_url, variant.profile())
    }

    pub fn with_profile(target_url: impl Into<String>, profile: ApiProfile) -> Result<Self> {
        let target_url = target_url.into();
        if target_url.trim().is_empty() {
            return Err(WebthumbError::EmptyTargetUrl);
        }

        Ok(Self {
            target_url,
            width: profile.width.min,
            height: profile.height.min,
            format: ImageFormat::default(),
            render_mode: RenderMode::default_for(profile.render_axis),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            encoding: UrlEncoding::default(),
            profile,
        })
    }

    pub fn with_width(mut self, width: i64) -> Self {
        self.width = self.profile.width.clamp(width);
        self
    }

    pub fn with_height(mut self, height: i64) -> Self {
        self.height = self.profile.height.clamp(height);
        self
    }

    /// Accepts `png`, `jpg` or `gif` in any letter case.
    pub fn with_format(mut self, format: &str) -> Result<Self> {
        self.format = format.parse()?;
        Ok(self)
    }

    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Accepts a screen width (`1024`, `1280`, `1650`, `1920`) for the legacy
    /// API or a browser engine (`chrome`, `firefox`, `opera`) for the browser API.
    pub fn with_render_mode(mut self, value: &str) -> Result<Self> {
        self.render_mode =
            RenderMode::parse_for(value, self.profile.render_axis, self.profile.variant)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    pub fn with_encoding(mut self, encoding: UrlEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn profile(&self) -> &ApiProfile {
        &self.profile
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn encoding(&self) -> UrlEncoding {
        self.encoding
    }

    /// Submit/fetch URL. Parameter order is fixed: width, height, format,
    /// render mode, url.
    pub fn capture_url(&self) -> String {
        let target = match self.encoding {
            UrlEncoding::Raw => self.target_url.clone(),
            UrlEncoding::Percent => {
                url::form_urlencoded::byte_serialize(self.target_url.as_bytes()).collect()
            }
        };

        format!(
            "{base}?width={width}&height={height}&format={format}&{axis}={mode}&url={target}",
            base = self.profile.base_url,
            width = self.width,
            height = self.height,
            format = self.format.as_str(),
            axis = self.render_mode.axis().query_key(),
            mode = self.render_mode.query_value(),
        )
    }

    pub fn status_url(&self) -> String {
        format!("{}&action=get-status", self.capture_url())
    }
}
