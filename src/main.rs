use clap::{Parser, Subcommand};
use popair_scraper::config::{ApiKey, Config};
use popair_scraper::constants;
use popair_scraper::error::ScraperError;
use popair_scraper::infra::http_client::ReqwestHttp;
use popair_scraper::logging;
use popair_scraper::observability;
use popair_scraper::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "popair_scraper")]
#[command(about = "Merge country population figures with OpenAQ air-quality measurements")]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum requests per API call while rate limited
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Base backoff delay in seconds; doubles after every rate-limited attempt
    #[arg(long, global = true)]
    retry_delay_secs: Option<u64>,

    /// Page size for the country listing
    #[arg(long, global = true)]
    page_size: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape population, fetch air quality, merge and save
    Run {
        #[arg(long, default_value = constants::COMBINED_OUTPUT)]
        output: PathBuf,
    },
    /// Scrape and clean the population table only
    Population {
        #[arg(long, default_value = constants::POPULATION_OUTPUT)]
        output: PathBuf,
    },
    /// Fetch one air-quality measurement per country only
    AirQuality {
        #[arg(long, default_value = constants::AIR_QUALITY_OUTPUT)]
        output: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(n) = cli.max_retries {
        config.openaq.max_retries = n;
    }
    if let Some(secs) = cli.retry_delay_secs {
        config.openaq.retry_delay_secs = secs;
    }
    if let Some(size) = cli.page_size {
        anyhow::ensure!(size > 0, "--page-size must be at least 1");
        config.openaq.page_size = size;
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let http = Arc::new(ReqwestHttp::new(Duration::from_secs(config.openaq.timeout_seconds))?);

    match cli.command {
        Commands::Run { output } => {
            // Credentials are checked before any request goes out
            let api_key = ApiKey::from_env()?;
            let pipeline = Pipeline::new(http, config);
            let result = pipeline.run(api_key, &output).await?;

            println!("\n📊 Pipeline Results:");
            println!("   Population rows: {}", result.population_rows);
            println!("   Countries listed: {}", result.countries);
            println!("   Measurements: {}", result.measurements);
            println!("   Removed (negative/non-numeric): {}", result.removed_rows);
            println!("   Merged rows: {}", result.reconciled_rows);
            match (&result.output_file, result.empty_stage) {
                (Some(file), _) => println!("   Output file: {}", file),
                (None, Some(stage)) => println!("   No output written: no {}", stage),
                (None, None) => println!("   No output written"),
            }
        }
        Commands::Population { output } => {
            let pipeline = Pipeline::new(http, config);
            let written = pipeline.run_population(&output).await?;
            println!("✅ Saved {} population rows to {}", written, output.display());
        }
        Commands::AirQuality { output } => {
            let api_key = ApiKey::from_env()?;
            let pipeline = Pipeline::new(http, config);
            let written = pipeline.run_air_quality(api_key, &output).await?;
            println!("✅ Saved {} measurements to {}", written, output.display());
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    info!("Starting popair_scraper");

    let metrics = observability::install_recorder()?;
    let outcome = run(cli).await;
    if let Err(e) = observability::write_snapshot(metrics, Path::new(constants::METRICS_SNAPSHOT)) {
        warn!("Could not write metrics snapshot: {}", e);
    }

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<ScraperError>() {
            Some(se) if se.is_empty_result() => {
                warn!("{}. Exiting without output.", se);
                Ok(())
            }
            _ => {
                error!("Run failed: {:#}", e);
                Err(e)
            }
        },
    }
}
