use std::path::PathBuf;
use std::process::ExitCode;

use webthumb_lib::{
    CancellationToken, JobStatus, StatusOutput, WebthumbError, WebthumbOutput, OUTPUT_VERSION,
};

use crate::cli::{OutputFormat, RequestArgs};
use crate::formatting::{render_error, write_output};
use crate::settings::{build_request, build_session, log_effective_config};

/// Run the status command: a single status check, no submit.
pub async fn run_status(
    config_path: Option<PathBuf>,
    verbose: bool,
    args: RequestArgs,
    format: OutputFormat,
) -> ExitCode {
    let (config, request) = match build_request(config_path.as_deref(), &args) {
        Ok(built) => built,
        Err(err) => return render_error(err, format),
    };
    if verbose {
        log_effective_config(config_path.as_deref(), &config, &request);
    }

    let session = match build_session(&config, verbose, CancellationToken::new()) {
        Ok(session) => session,
        Err(err) => return render_error(err, format),
    };
    let status = match session.poll_status(&request).await {
        Ok(status) => status,
        Err(err) => return render_error(err, format),
    };

    let body = WebthumbOutput::Status(StatusOutput {
        version: OUTPUT_VERSION.to_string(),
        request: (&request).into(),
        status_url: request.status_url(),
        finished: status == JobStatus::Finished,
    });
    if let Err(err) = write_output(&body, format) {
        return render_error(WebthumbError::Config(err.to_string()), format);
    }
    ExitCode::SUCCESS
}
