use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use diskwatch::config::{Settings, DEFAULT_SETTINGS_FILE};
use diskwatch::RunOptions;

#[derive(Parser)]
#[command(
    name = "diskwatch",
    about = "Monitor free disk space and send Pushover alerts when it runs low",
    version,
    long_about = None
)]
struct Cli {
    /// Settings file (JSON, or TOML with a .toml extension)
    #[arg(short, long, env = "DISKWATCH_SETTINGS", default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Skip rendering free-space charts
    #[arg(long)]
    no_chart: bool,

    /// Diagnostic log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let settings = Settings::load(&cli.settings).with_context(|| {
        format!(
            "could not load settings; check {}",
            cli.settings.display()
        )
    })?;

    let summary = diskwatch::run(
        settings,
        RunOptions {
            charts: !cli.no_chart,
        },
    )
    .await?;

    tracing::debug!(
        checked = summary.checked(),
        skipped = summary.skipped(),
        "exiting"
    );
    Ok(())
}
