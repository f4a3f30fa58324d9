use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::backoff::{BackoffFetcher, RetryPolicy};
use super::paginate::collect_all;
use crate::app::ports::HttpClientPort;
use crate::config::{ApiKey, OpenAqConfig};
use crate::constants::{OPENAQ_COUNTRIES_PATH, OPENAQ_MEASUREMENTS_PATH};
use crate::error::{Result, ScraperError};
use crate::types::{AirQualityRow, CountryEntity, MeasurementRecord};

/// Client for the two OpenAQ shapes this crate understands: the country
/// listing and the single-item measurement query.
pub struct OpenAqClient {
    fetcher: BackoffFetcher,
    base_url: String,
    page_size: u32,
    policy: RetryPolicy,
}

impl OpenAqClient {
    pub fn new(http: Arc<dyn HttpClientPort>, api_key: ApiKey, config: &OpenAqConfig) -> Self {
        Self {
            fetcher: BackoffFetcher::new(http, api_key),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            policy: config.retry_policy(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Every country the API knows about; partial on upstream failure.
    pub async fn countries(&self) -> Vec<CountryEntity> {
        let endpoint = self.endpoint(OPENAQ_COUNTRIES_PATH);
        collect_all(&self.fetcher, &endpoint, self.page_size, &self.policy).await
    }

    /// Most recent measurement for one country, `None` when it has none.
    #[instrument(skip(self))]
    pub async fn latest_measurement(&self, country_code: &str) -> Result<Option<MeasurementRecord>> {
        let endpoint = self.endpoint(OPENAQ_MEASUREMENTS_PATH);
        let params = [("country", country_code.to_string()), ("limit", "1".to_string())];
        let body = self.fetcher.fetch_one(&endpoint, &params, &self.policy).await?;
        parse_measurement(country_code, &body)
    }

    /// Fetch one measurement per country, strictly one after another.
    ///
    /// Countries whose fetch fails or that have no data are skipped.
    pub async fn air_quality(&self, countries: &[CountryEntity]) -> Vec<AirQualityRow> {
        let mut rows = Vec::with_capacity(countries.len());
        let mut failed = 0usize;
        let mut empty = 0usize;

        for country in countries {
            match self.latest_measurement(&country.code).await {
                Ok(Some(measurement)) => {
                    rows.push(AirQualityRow::from_measurement(country, measurement));
                }
                Ok(None) => {
                    debug!("No measurements for {} ({})", country.name, country.code);
                    empty += 1;
                }
                Err(e) => {
                    warn!("Skipping {} ({}): {}", country.name, country.code, e);
                    failed += 1;
                }
            }
        }

        info!(
            "Fetched air quality for {} of {} countries ({} without data, {} failed)",
            rows.len(),
            countries.len(),
            empty,
            failed
        );
        rows
    }
}

/// Take the first entry of a measurement listing body.
pub fn parse_measurement(country_code: &str, body: &Value) -> Result<Option<MeasurementRecord>> {
    let results = body["results"]
        .as_array()
        .ok_or_else(|| ScraperError::MissingField("results not found".into()))?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let parameter = first["parameter"]
        .as_str()
        .ok_or_else(|| ScraperError::MissingField("parameter not found".into()))?;
    let value = first
        .get("value")
        .cloned()
        .ok_or_else(|| ScraperError::MissingField("value not found".into()))?;
    let timestamp = first["date"]["utc"].as_str().map(|s| s.to_string());

    Ok(Some(MeasurementRecord {
        country_code: country_code.to_string(),
        parameter: parameter.to_string(),
        value,
        timestamp,
    }))
}
