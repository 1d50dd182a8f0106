use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use greenalpha_core::{
    engine::{builder::FootprintEngineBuilder, engine::FootprintEngine},
    history::HistoricalEmissionsRepository,
    reference::ReferenceDataStore,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;

mod config;
mod plotting;
mod requests;
mod workflow;

#[derive(Parser)]
#[command(name = "greenalpha", version, about = "Product carbon footprint estimation")]
struct Cli {
    /// Config file. Defaults to ./greenalpha.yaml when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Calculate the footprint of a single request file.
    Calculate {
        path: PathBuf,
        /// Print the full result as JSON instead of the report.
        #[arg(long)]
        json: bool,
    },
    /// Calculate a batch file and write results, report and chart to a run directory.
    Batch { path: PathBuf },
    /// Show the emissions profile of a country.
    Country { code: String },
    /// Show historical emissions of a country.
    History {
        code: String,
        #[arg(long)]
        start: Option<i32>,
        #[arg(long)]
        end: Option<i32>,
        /// Write a line chart of the series to this PNG file.
        #[arg(long)]
        plot: Option<PathBuf>,
    },
    /// Search countries by name or code.
    Search { query: String },
    /// Global emission statistics.
    Stats,
    /// Engine and repository health.
    Status,
    /// List emission factors and carbon prices.
    Factors,
    /// List transport modes and their factors.
    Modes,
    /// List the product catalog.
    Products,
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log level")?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialise logging")?;
    Ok(())
}

fn build_engine(config: &AppConfig) -> Result<FootprintEngine> {
    let reference = match &config.reference_data_dir {
        Some(dir) => ReferenceDataStore::load_dir(dir)
            .with_context(|| format!("Failed to load reference data from {:?}", dir))?,
        None => ReferenceDataStore::builtin(),
    };

    let mut builder = FootprintEngineBuilder::new()
        .with_reference_data(Arc::new(reference))
        .with_config(config.engine_config());
    if let Some(repository_config) = config.repository_config() {
        builder = builder.with_repository(Arc::new(HistoricalEmissionsRepository::new(repository_config)));
    }
    Ok(builder.build()?)
}

fn repository(engine: &FootprintEngine) -> Result<&Arc<HistoricalEmissionsRepository>> {
    match engine.repository() {
        Some(repository) => Ok(repository),
        None => bail!("No historical data configured (set historical_data_path in the config file)"),
    }
}

async fn run_batch(engine: &FootprintEngine, config: &AppConfig, path: &Path) -> Result<()> {
    let batch = requests::load_batch(path)?;
    let outcome = engine.calculate_batch(&batch).await?;
    workflow::print_batch_summary(&outcome);

    let run_dir = config
        .output_dir
        .join(format!("batch_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));
    workflow::write_batch_outputs(&run_dir, &batch, &outcome)?;

    // Keep the input next to the outputs for traceability.
    fs::copy(path, run_dir.join("requests.yaml"))
        .with_context(|| format!("Failed to copy {:?} into {:?}", path, run_dir))?;

    if outcome.successful_calculations > 0 {
        if let Err(e) = plotting::plot_batch_scopes(&run_dir.join("scopes.png"), &outcome) {
            warn!(error = %e, "Could not draw scope chart");
        }
    }

    println!("\nBatch complete. Results are in '{}'", run_dir.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log_level)?;

    let engine = build_engine(&config)?;
    info!(
        products = engine.reference().products().count(),
        history = engine.repository().is_some(),
        "GreenAlpha engine ready"
    );

    match cli.command {
        Command::Calculate { path, json } => {
            let request = requests::load_request(&path)?;
            let result = engine
                .calculate_with_timeout(&request, engine.config().request_timeout)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                workflow::print_footprint_report(&request, &result);
            }
        }
        Command::Batch { path } => run_batch(&engine, &config, &path).await?,
        Command::Country { code } => {
            let profile = repository(&engine)?
                .profile(&code)
                .await?
                .with_context(|| format!("No emissions data for country '{}'", code))?;
            workflow::print_country_profile(&profile);
        }
        Command::History { code, start, end, plot } => {
            let records = repository(&engine)?.history(&code, start, end).await?;
            workflow::print_history(&code.to_uppercase(), &records);
            if let Some(plot_path) = plot {
                if records.is_empty() {
                    warn!(country = %code, "No records to plot");
                } else {
                    plotting::plot_history(&plot_path, &code.to_uppercase(), &records)?;
                    println!("Chart written to '{}'", plot_path.display());
                }
            }
        }
        Command::Search { query } => {
            let results = repository(&engine)?.search(&query).await?;
            workflow::print_search_results(&query, &results);
        }
        Command::Stats => {
            let stats = repository(&engine)?.global_statistics().await?;
            workflow::print_global_statistics(&stats);
        }
        Command::Status => {
            if let Some(repository) = engine.repository() {
                if let Err(e) = repository.initialize().await {
                    warn!(error = %e, "Historical data unavailable");
                }
            }
            println!("{}", serde_json::to_string_pretty(&engine.health())?);
            println!("{}", serde_json::to_string_pretty(&engine.performance_stats())?);
        }
        Command::Factors => workflow::print_emission_factors(engine.reference()),
        Command::Modes => workflow::print_transport_modes(engine.reference()),
        Command::Products => workflow::print_products(engine.reference()),
    }

    Ok(())
}
