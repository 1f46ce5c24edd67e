use std::path::PathBuf;
use std::process::ExitCode;

use webthumb_lib::{UrlOutput, WebthumbError, WebthumbOutput, OUTPUT_VERSION};

use crate::cli::{OutputFormat, RequestArgs};
use crate::formatting::{render_error, write_output};
use crate::settings::{build_request, log_effective_config};

/// Run the url command. Never touches the network.
pub fn run_url(
    config_path: Option<PathBuf>,
    verbose: bool,
    args: RequestArgs,
    status: bool,
    format: OutputFormat,
) -> ExitCode {
    let (config, request) = match build_request(config_path.as_deref(), &args) {
        Ok(built) => built,
        Err(err) => return render_error(err, format),
    };
    if verbose {
        log_effective_config(config_path.as_deref(), &config, &request);
    }

    let result = match format {
        // JSON always carries both URLs; --status only selects the bare one.
        OutputFormat::Json => {
            let body = WebthumbOutput::Url(UrlOutput {
                version: OUTPUT_VERSION.to_string(),
                request: (&request).into(),
                capture_url: request.capture_url(),
                status_url: request.status_url(),
            });
            write_output(&body, format)
        }
        // Bare URL so it can be piped into curl and friends.
        OutputFormat::Pretty => {
            let url = if status {
                request.status_url()
            } else {
                request.capture_url()
            };
            println!("{url}");
            Ok(())
        }
    };
    if let Err(err) = result {
        return render_error(WebthumbError::Config(err.to_string()), format);
    }
    ExitCode::SUCCESS
}
