mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_capture, run_status, run_url};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Capture {
            request,
            output,
            no_wait,
            format,
        } => run_capture(args.config, args.verbose, request, output, no_wait, format).await,
        Commands::Url {
            request,
            status,
            format,
        } => run_url(args.config, args.verbose, request, status, format),
        Commands::Status { request, format } => {
            run_status(args.config, args.verbose, request, format).await
        }
    }
}

/// Logs go to stderr; stdout may carry image bytes. RUST_LOG wins when set.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("webthumb_lib={level},webthumb={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
