use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::app::ports::HttpClientPort;
use crate::config::{ApiKey, Config};
use crate::error::{Result, ScraperError};
use crate::ingestion::OpenAqClient;
use crate::output::write_csv;
use crate::processing::reconcile;
use crate::scrapers::fetch_population_rows;
use crate::types::{AirQualityRow, PopulationRow};

/// Summary of a full run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub population_rows: usize,
    pub countries: usize,
    pub measurements: usize,
    pub reconciled_rows: usize,
    pub removed_rows: usize,
    /// `None` when nothing was written
    pub output_file: Option<String>,
    /// Stage that came back empty and ended the run early
    pub empty_stage: Option<&'static str>,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
}

impl PipelineResult {
    fn started() -> Self {
        Self {
            population_rows: 0,
            countries: 0,
            measurements: 0,
            reconciled_rows: 0,
            removed_rows: 0,
            output_file: None,
            empty_stage: None,
            started_at: Utc::now(),
            duration_secs: 0.0,
        }
    }
}

/// Countries listed by the air-quality API and the measurements gathered
/// for them.
#[derive(Debug, Clone, Default)]
pub struct AirQualityBatch {
    pub countries: usize,
    pub rows: Vec<AirQualityRow>,
}

impl AirQualityBatch {
    /// Empty listings and empty measurement sets both end a run early.
    pub fn require_rows(&self) -> Result<()> {
        if self.countries == 0 {
            return Err(ScraperError::EmptyResult("countries from the air-quality API"));
        }
        if self.rows.is_empty() {
            return Err(ScraperError::EmptyResult("air quality data"));
        }
        Ok(())
    }
}

/// Scrape, fetch, reconcile and persist. Everything runs sequentially on the
/// caller's task.
pub struct Pipeline {
    http: Arc<dyn HttpClientPort>,
    config: Config,
}

impl Pipeline {
    pub fn new(http: Arc<dyn HttpClientPort>, config: Config) -> Self {
        Self { http, config }
    }

    /// Population table, names cleaned. Fails the run when the page or its
    /// table cannot be read.
    pub async fn scrape_population(&self) -> Result<Vec<PopulationRow>> {
        let rows = fetch_population_rows(self.http.as_ref(), &self.config.population.url).await?;
        if rows.is_empty() {
            return Err(ScraperError::EmptyResult("population rows"));
        }
        Ok(rows)
    }

    /// List countries, then ask for one measurement each. No measurement
    /// requests go out when the listing is empty.
    pub async fn fetch_air_quality(&self, api_key: ApiKey) -> AirQualityBatch {
        let client = OpenAqClient::new(self.http.clone(), api_key, &self.config.openaq);

        let countries = client.countries().await;
        if countries.is_empty() {
            return AirQualityBatch::default();
        }

        let rows = client.air_quality(&countries).await;
        AirQualityBatch {
            countries: countries.len(),
            rows,
        }
    }

    async fn run_stages(&self, api_key: ApiKey, output: &Path, summary: &mut PipelineResult) -> Result<()> {
        let population = self.scrape_population().await?;
        summary.population_rows = population.len();

        let batch = self.fetch_air_quality(api_key).await;
        summary.countries = batch.countries;
        summary.measurements = batch.rows.len();
        batch.require_rows()?;

        let reconciliation = reconcile(&population, &batch.rows);
        summary.removed_rows = reconciliation.removed_count;
        summary.reconciled_rows = reconciliation.rows.len();
        if reconciliation.is_empty() {
            return Err(ScraperError::EmptyResult("rows after merging"));
        }

        write_csv(output, &reconciliation.rows)?;
        summary.output_file = Some(output.display().to_string());
        Ok(())
    }

    /// Full run. Empty intermediate results end the run cleanly with no
    /// output file; anything else propagates.
    #[instrument(skip(self, api_key))]
    pub async fn run(&self, api_key: ApiKey, output: &Path) -> Result<PipelineResult> {
        let mut summary = PipelineResult::started();
        let t0 = std::time::Instant::now();

        match self.run_stages(api_key, output, &mut summary).await {
            Ok(()) => info!("Combined data saved to {}", output.display()),
            Err(ScraperError::EmptyResult(stage)) => {
                warn!("No {}; nothing saved", stage);
                summary.empty_stage = Some(stage);
            }
            Err(e) => return Err(e),
        }

        summary.duration_secs = t0.elapsed().as_secs_f64();
        Ok(summary)
    }

    /// Scrape the population table alone and save it.
    #[instrument(skip(self))]
    pub async fn run_population(&self, output: &Path) -> Result<usize> {
        let rows = self.scrape_population().await?;
        write_csv(output, &rows)
    }

    /// Fetch measurements for every country and save them without merging.
    #[instrument(skip(self, api_key))]
    pub async fn run_air_quality(&self, api_key: ApiKey, output: &Path) -> Result<usize> {
        let batch = self.fetch_air_quality(api_key).await;
        batch.require_rows()?;
        write_csv(output, &batch.rows)
    }
}
