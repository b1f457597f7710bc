use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use slack_archive_core::{Settings, export_archive};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "slack-archive",
    version,
    about = "Render a Slack channel export as a single static HTML page"
)]
struct Cli {
    /// Channel export JSON files, or directories containing them
    #[arg(required = true, value_name = "INPUT_JSON")]
    input_json: Vec<PathBuf>,

    /// Where to write the HTML page
    #[arg(
        long,
        alias = "output_file",
        value_name = "PATH",
        default_value = "index.html"
    )]
    output_file: PathBuf,

    /// Settings file (TOML); falls back to $SLACK_ARCHIVE_CONFIG, then the user config dir
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> slack_archive_core::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let summary = export_archive(&cli.input_json, &cli.output_file, &settings)?;
    tracing::info!(
        fetch_script = %summary.fetch_script.display(),
        "run `sh {}` to download avatars and attachments",
        summary.fetch_script.display()
    );
    Ok(())
}
