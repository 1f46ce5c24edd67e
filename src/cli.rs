use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use webthumb_lib::ApiVariant;

#[derive(Parser)]
#[command(name = "webthumb")]
#[command(
    version,
    about = "Webthumbnail - Capture website thumbnails through the webthumbnail.org API",
    long_about = "Webthumbnail client\n\nModes:\n- capture: submit a capture, wait for it to finish and save the image.\n- url: print the capture (or status) URL without contacting the API.\n- status: ask the API once whether a capture has finished.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) with request/HTTP defaults; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a thumbnail and write it to a file or stdout
    Capture {
        #[command(flatten)]
        request: RequestArgs,

        #[arg(
            long,
            short,
            help = "Write the image to this file (raw bytes go to stdout if omitted)"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Fetch immediately instead of polling until the capture finishes")]
        no_wait: bool,

        #[arg(long, value_enum, default_value = "json", help = "Summary output format")]
        format: OutputFormat,
    },

    /// Print the API URL for a request without contacting the API
    Url {
        #[command(flatten)]
        request: RequestArgs,

        #[arg(
            long,
            help = "Print the status URL instead of the capture URL (pretty format only; JSON carries both)"
        )]
        status: bool,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,
    },

    /// Check once whether a capture has finished
    Status {
        #[command(flatten)]
        request: RequestArgs,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,
    },
}

/// Request flags shared by every subcommand. Unset flags fall back to config.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    #[arg(long, help = "Page to capture")]
    pub url: String,

    #[arg(long, value_enum, help = "API variant (legacy: screen widths, browser: engines)")]
    pub variant: Option<VariantArg>,

    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Thumbnail width (clamped into the variant's range)"
    )]
    pub width: Option<i64>,

    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Thumbnail height (clamped into the variant's range)"
    )]
    pub height: Option<i64>,

    #[arg(long, value_name = "FORMAT", help = "Image format (png, jpg, gif)")]
    pub image_format: Option<String>,

    #[arg(
        long,
        value_name = "MODE",
        help = "Screen width (1024/1280/1650/1920) or browser (chrome/firefox/opera)"
    )]
    pub render_mode: Option<String>,

    #[arg(long, value_name = "POLLS", help = "Status checks allowed before giving up")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Percent-encode the target URL in the query string")]
    pub encode_url: bool,

    #[arg(long, value_name = "URL", help = "Override the API endpoint")]
    pub base_url: Option<String>,

    #[arg(long, help = "Referer header sent to the API")]
    pub referer: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Legacy,
    Browser,
}

impl From<VariantArg> for ApiVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Legacy => ApiVariant::Legacy,
            VariantArg::Browser => ApiVariant::Browser,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
