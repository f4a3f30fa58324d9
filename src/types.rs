use serde::{Deserialize, Serialize};

/// A country as listed by the air-quality API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryEntity {
    pub code: String,
    pub name: String,
}

/// First measurement returned for a country. `value` is kept as delivered
/// upstream; numeric coercion happens during reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub country_code: String,
    pub parameter: String,
    pub value: serde_json::Value,
    pub timestamp: Option<String>,
}

/// Measurement side of the join, labelled with the country's display name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityRow {
    pub country_name: String,
    pub pollution_value: serde_json::Value,
    pub parameter: String,
    pub timestamp: Option<String>,
}

impl AirQualityRow {
    pub fn from_measurement(country: &CountryEntity, measurement: MeasurementRecord) -> Self {
        Self {
            country_name: country.name.clone(),
            pollution_value: measurement.value,
            parameter: measurement.parameter,
            timestamp: measurement.timestamp,
        }
    }
}

/// One row of the scraped population table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulationRow {
    pub country_name: String,
    /// Digit string with thousands separators removed
    pub population: String,
    pub population_share: String,
    /// Date of the figure as printed in the table, when the row has one
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRow {
    pub country_name: String,
    pub population: String,
    pub population_share: String,
    pub pollution_value: f64,
    pub parameter: String,
}
