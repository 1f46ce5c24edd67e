use std::path::Path;

use webthumb_lib::{
    ApiVariant, CancellationToken, CaptureRequest, CaptureSession, CaptureState, Config,
    ReqwestTransport, WebthumbError,
};

use crate::cli::RequestArgs;

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/webthumb/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, WebthumbError> {
    Config::load(path).map_err(|e| WebthumbError::Config(e.to_string()))
}

/// Validate the config after CLI flags have been merged in.
pub fn validate_config(path: Option<&Path>, config: &Config) -> Result<(), WebthumbError> {
    config.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        WebthumbError::Config(prefix)
    })
}

/// Merge CLI request flags into the config, preferring CLI values when given.
/// A render mode belongs to one variant, so switching the variant on the
/// command line drops the configured mode unless `--render-mode` is given too.
pub fn resolve_config(mut config: Config, args: &RequestArgs) -> Config {
    if let Some(variant) = args.variant {
        let variant: ApiVariant = variant.into();
        if variant != config.variant {
            config.render_mode = None;
        }
        config.variant = variant;
    }
    if let Some(base_url) = &args.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(width) = args.width {
        config.width = Some(width);
    }
    if let Some(height) = args.height {
        config.height = Some(height);
    }
    if let Some(format) = &args.image_format {
        config.format = Some(format.clone());
    }
    if let Some(mode) = &args.render_mode {
        config.render_mode = Some(mode.clone());
    }
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    if args.encode_url {
        config.encode_target = true;
    }
    if let Some(referer) = &args.referer {
        config.http.referer = Some(referer.clone());
    }
    config
}

/// Load, merge and turn into a request in one step. Request fields fail with
/// their own validation errors; the remaining merged config is checked after.
pub fn build_request(
    config_path: Option<&Path>,
    args: &RequestArgs,
) -> Result<(Config, CaptureRequest), WebthumbError> {
    let config = resolve_config(load_config(config_path)?, args);
    let request = config.request_for(args.url.clone())?;
    validate_config(config_path, &config)?;
    Ok((config, request))
}

/// Session wired with the configured transport, headers and poll policy.
pub fn build_session(
    config: &Config,
    verbose: bool,
    cancel: CancellationToken,
) -> Result<CaptureSession<ReqwestTransport>, WebthumbError> {
    let transport = ReqwestTransport::with_timeout(config.http.request_timeout)?;
    let mut session = CaptureSession::new(transport)
        .with_context(config.request_context())
        .with_submit_policy(config.poll.submit_errors)
        .with_cancellation(cancel);
    if let Some(interval) = config.poll.interval {
        session = session.with_poll_interval(interval);
    }
    if verbose {
        session = session.on_state(std::sync::Arc::new(|state: CaptureState| {
            eprintln!("Capture state: {}", state_label(state));
        }));
    }
    Ok(session)
}

fn state_label(state: CaptureState) -> &'static str {
    match state {
        CaptureState::Idle => "idle",
        CaptureState::Submitted => "submitted",
        CaptureState::Polling => "polling…",
        CaptureState::Finished => "finished, fetching image",
        CaptureState::TimedOut => "timed out",
        CaptureState::ProtocolError => "invalid response from server",
        CaptureState::Cancelled => "cancelled",
    }
}

/// Log effective config to stderr (verbose mode).
pub fn log_effective_config(config_path: Option<&Path>, config: &Config, request: &CaptureRequest) {
    eprintln!("{}", format_effective_config(config, request, config_path));
}

/// Format effective config as a single-line string.
pub fn format_effective_config(
    config: &Config,
    request: &CaptureRequest,
    config_source: Option<&Path>,
) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let poll = config
        .poll
        .interval
        .unwrap_or(request.profile().poll_interval);
    format!(
        "Effective config [{source}]: variant={}, endpoint={}, size={}x{}, format={}, {}, timeout={} polls every {}ms, request-timeout={}s, submit-errors={:?}",
        request.profile().variant,
        request.profile().base_url,
        request.width(),
        request.height(),
        request.format(),
        request.render_mode(),
        request.timeout_secs(),
        poll.as_millis(),
        config.http.request_timeout.as_secs(),
        config.poll.submit_errors,
    )
}
