use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use webthumb_lib::{ErrorOutput, WebthumbError, WebthumbOutput, OUTPUT_VERSION};

use crate::cli::OutputFormat;

/// Write output in the requested format to stdout.
pub fn write_output(
    body: &WebthumbOutput,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(body)?),
        OutputFormat::Pretty => write_pretty_output(body, &mut io::stdout())?,
    };
    Ok(())
}

/// Write a summary to stderr; used when stdout carries the image bytes.
pub fn write_summary_stderr(
    body: &WebthumbOutput,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => eprintln!("{}", serde_json::to_string(body)?),
        OutputFormat::Pretty => write_pretty_output(body, &mut io::stderr())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: WebthumbError, format: OutputFormat) -> ExitCode {
    emit_error(err, format, false)
}

/// Like [`render_error`], but JSON goes to stderr. Used while stdout carries
/// image bytes.
pub fn render_error_stderr(err: WebthumbError, format: OutputFormat) -> ExitCode {
    emit_error(err, format, true)
}

fn emit_error(err: WebthumbError, format: OutputFormat, json_to_stderr: bool) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = WebthumbOutput::Error(ErrorOutput {
        version: OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if json_to_stderr {
                eprintln!("{content}");
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, &mut io::stderr()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    ExitCode::from(2)
}

/// Human-readable text on a terminal, pretty JSON otherwise.
fn write_pretty_output<W: io::Write + IsTerminal>(
    body: &WebthumbOutput,
    out: &mut W,
) -> io::Result<()> {
    let content = if out.is_terminal() {
        format_pretty(body, true)
    } else {
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string())
    };
    writeln!(out, "{}", content.trim_end())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &WebthumbOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        WebthumbOutput::Capture(out) => {
            let header = color("[CAPTURE]", "32", colorize);
            writeln!(
                buf,
                "{} {} ({}x{} {}, {})",
                header,
                out.request.target,
                out.request.width,
                out.request.height,
                out.request.format,
                out.request.variant
            )
            .ok();
            writeln!(
                buf,
                "Response: HTTP {} {} ({} bytes)",
                out.status_code, out.content_type, out.content_length
            )
            .ok();
            if !out.waited {
                writeln!(buf, "Fetched without waiting for the capture to finish").ok();
            }
            if let Some(path) = &out.output_path {
                writeln!(buf, "Saved to: {}", path.display()).ok();
            }
        }
        WebthumbOutput::Url(out) => {
            let header = color("[URL]", "36", colorize);
            writeln!(buf, "{} {}", header, out.request.target).ok();
            writeln!(buf, "Capture: {}", out.capture_url).ok();
            writeln!(buf, "Status:  {}", out.status_url).ok();
        }
        WebthumbOutput::Status(out) => {
            let (label, code) = if out.finished {
                ("FINISHED", "32")
            } else {
                ("PENDING", "33")
            };
            writeln!(buf, "{} {}", color(label, code, colorize), out.request.target).ok();
            writeln!(buf, "Status URL: {}", out.status_url).ok();
        }
        WebthumbOutput::Error(out) => {
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
        }
    }
    buf
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}
