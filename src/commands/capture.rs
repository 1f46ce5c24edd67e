use std::path::PathBuf;
use std::process::ExitCode;

use webthumb_lib::{CancellationToken, CaptureOutput, WebthumbError, WebthumbOutput};

use crate::cli::{OutputFormat, RequestArgs};
use crate::formatting::{render_error, render_error_stderr, write_output, write_summary_stderr};
use crate::settings::{build_request, build_session, log_effective_config};

/// Run the capture command.
pub async fn run_capture(
    config_path: Option<PathBuf>,
    verbose: bool,
    args: RequestArgs,
    output: Option<PathBuf>,
    no_wait: bool,
    format: OutputFormat,
) -> ExitCode {
    // Without --output, stdout carries the image bytes.
    let streaming = output.is_none();
    let fail = |err: WebthumbError| {
        if streaming {
            render_error_stderr(err, format)
        } else {
            render_error(err, format)
        }
    };

    let (config, request) = match build_request(config_path.as_deref(), &args) {
        Ok(built) => built,
        Err(err) => return fail(err),
    };
    if verbose {
        log_effective_config(config_path.as_deref(), &config, &request);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let session = match build_session(&config, verbose, cancel) {
        Ok(session) => session,
        Err(err) => return fail(err),
    };
    let wait = !no_wait;

    match output {
        Some(path) => {
            if verbose {
                eprintln!("Capturing {} into {}", request.target_url(), path.display());
            }
            let result = match session.capture_to_file(&request, &path, wait).await {
                Ok(result) => result,
                Err(err) => return fail(err),
            };
            let body = WebthumbOutput::Capture(CaptureOutput::new(
                &request,
                &result,
                wait,
                Some(path),
            ));
            if let Err(err) = write_output(&body, format) {
                return render_error(WebthumbError::Config(err.to_string()), format);
            }
        }
        None => {
            let mut stdout = tokio::io::stdout();
            let result = match session.capture_to_writer(&request, &mut stdout, wait).await {
                Ok(result) => result,
                Err(err) => return fail(err),
            };
            if verbose {
                let body =
                    WebthumbOutput::Capture(CaptureOutput::new(&request, &result, wait, None));
                if let Err(err) = write_summary_stderr(&body, format) {
                    eprintln!("Failed to write summary: {}", err);
                }
            }
        }
    }

    ExitCode::SUCCESS
}
