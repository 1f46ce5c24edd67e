use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::request::{CaptureRequest, ImageFormat, RenderMode, UrlEncoding};
use crate::session::SubmitPolicy;
use crate::transport::{RequestContext, DEFAULT_REQUEST_TIMEOUT};
use crate::variant::{ApiVariant, DEFAULT_TIMEOUT_SECS};

const CONFIG_DIR: &str = "webthumb";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Defaults for capture requests and the HTTP layer, usually read from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: ApiVariant,
    pub base_url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub format: Option<String>,
    pub render_mode: Option<String>,
    /// Status checks allowed before giving up.
    pub timeout: u64,
    pub encode_target: bool,
    pub http: HttpConfig,
    pub poll: PollConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub referer: Option<String>,
    pub host_software: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            referer: None,
            host_software: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    #[serde(with = "humantime_serde")]
    pub interval: Option<Duration>,
    pub submit_errors: SubmitPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variant: ApiVariant::default(),
            base_url: None,
            width: None,
            height: None,
            format: None,
            render_mode: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            encode_target: false,
            http: HttpConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl Config {
    /// Priority: explicit path > central config > defaults.
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::central_config_path() {
            Some(central) if central.is_file() => Self::from_file(&central),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `$XDG_CONFIG_HOME/webthumb/config.toml`, else `~/.config/webthumb/config.toml`.
    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let Some(format) = &self.format {
            format
                .parse::<ImageFormat>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if let Some(mode) = &self.render_mode {
            let profile = self.variant.profile();
            RenderMode::parse_for(mode, profile.render_axis, self.variant)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if self.http.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "http.request_timeout must be greater than zero".into(),
            ));
        }
        if matches!(self.poll.interval, Some(interval) if interval.is_zero()) {
            return Err(ConfigError::Invalid(
                "poll.interval must be greater than zero".into(),
            ));
        }
        if let Some(base_url) = &self.base_url {
            if base_url.trim().is_empty() {
                return Err(ConfigError::Invalid("base_url must not be empty".into()));
            }
            url::Url::parse(base_url)
                .map_err(|e| ConfigError::Invalid(format!("base_url '{base_url}': {e}")))?;
        }
        Ok(())
    }

    /// Build a request for `target` with the configured defaults applied.
    pub fn request_for(&self, target: impl Into<String>) -> Result<CaptureRequest> {
        let mut profile = self.variant.profile();
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url)?;
            profile = profile.with_base_url(base_url.clone());
        }

        let mut request = CaptureRequest::with_profile(target, profile)?
            .with_timeout(self.timeout)
            .with_encoding(if self.encode_target {
                UrlEncoding::Percent
            } else {
                UrlEncoding::Raw
            });
        if let Some(width) = self.width {
            request = request.with_width(width);
        }
        if let Some(height) = self.height {
            request = request.with_height(height);
        }
        if let Some(format) = &self.format {
            request = request.with_format(format)?;
        }
        if let Some(mode) = &self.render_mode {
            request = request.with_render_mode(mode)?;
        }
        Ok(request)
    }

    pub fn request_context(&self) -> RequestContext {
        RequestContext {
            referer: self.http.referer.clone(),
            host_software: self.http.host_software.clone(),
        }
    }
}
