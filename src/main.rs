mod errors;
mod graph;
mod ingest;
mod publisher;
mod records;
mod settings;

use std::path::PathBuf;

use clap::Parser;
use miette::Result;
use tracing_subscriber::{fmt, EnvFilter};

use errors::OrreryError;
use publisher::Publisher;
use settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "orrery",
    version,
    about = "Builds an application's authorization graph and publishes it"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Directory holding the csv tables (overrides the config file)
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Write the canonical payload to this file before pushing
    #[arg(long)]
    save_json: Option<PathBuf>,

    /// Build and validate the graph but skip the push
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::info!(config = %cli.config, "Loaded configuration");

    run(&cli, &settings).await?;
    Ok(())
}

async fn run(cli: &Cli, settings: &Settings) -> std::result::Result<(), OrreryError> {
    // Credentials and the base url are checked before any graph work so a
    // misconfigured run fails in milliseconds, not after the whole build.
    settings.validate()?;
    let publisher = Publisher::new(&settings.service.base_url, &settings.service.api_key)?;

    let csv_dir = cli
        .csv_dir
        .clone()
        .unwrap_or_else(|| settings.input.csv_dir.clone());
    let app = ingest::load_application(
        &csv_dir,
        &settings.application.name,
        &settings.application.application_type,
        settings.application.description.as_deref(),
    )?;

    let assembled = graph::assemble(&app)?;
    for warning in &assembled.warnings {
        tracing::warn!(%warning, "assembly warning");
    }

    if let Some(path) = &cli.save_json {
        std::fs::write(path, assembled.document.to_json_pretty()?)?;
        tracing::info!(path = %path.display(), "wrote canonical payload");
    }

    if cli.dry_run {
        tracing::info!("dry run, skipping push");
        return Ok(());
    }

    let outcome = publisher
        .push_application(
            settings.provider_name(),
            &settings.data_source_name(),
            &assembled.document,
        )
        .await?;
    for warning in &outcome.warnings {
        tracing::warn!(%warning, "service warning");
    }
    tracing::info!(
        application = %settings.application.name,
        provider = %settings.provider_name(),
        "authorization graph published"
    );
    Ok(())
}
