use metrics::counter;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::normalize::{join_key, normalize_name};
use crate::observability::ROWS_REMOVED_TOTAL;
use crate::types::{AirQualityRow, PopulationRow, ReconciledRow};

/// Outcome of joining population and air-quality rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub rows: Vec<ReconciledRow>,
    /// Joined rows dropped by the value filter (pre-filter minus post-filter)
    pub removed_count: usize,
    /// Of `removed_count`, rows whose value could not be read as a number
    pub non_numeric_count: usize,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read an upstream value as a number. Numeric strings are accepted;
/// anything else, NaN included, is `None`.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (!n.is_nan()).then_some(n)
}

/// Inner join on the normalized, lower-cased country name.
///
/// Output follows population-table order and keeps the population-side
/// label. Only the first row per key on either side takes part, so each
/// country appears at most once. Rows whose pollution value is negative or
/// not numeric are filtered out after the join.
pub fn reconcile(population: &[PopulationRow], air_quality: &[AirQualityRow]) -> Reconciliation {
    let mut measurements: HashMap<String, &AirQualityRow> = HashMap::new();
    for row in air_quality {
        let key = join_key(&row.country_name);
        if measurements.contains_key(&key) {
            debug!("Duplicate measurement row for '{}' ignored", key);
            continue;
        }
        measurements.insert(key, row);
    }

    let mut seen = HashSet::new();
    let mut joined: Vec<(ReconciledRow, bool)> = Vec::new();
    for pop in population {
        let key = join_key(&pop.country_name);
        let Some(aq) = measurements.get(&key) else {
            continue;
        };
        if !seen.insert(key) {
            continue;
        }
        let value = coerce_numeric(&aq.pollution_value);
        joined.push((
            ReconciledRow {
                country_name: normalize_name(&pop.country_name),
                population: pop.population.clone(),
                population_share: pop.population_share.clone(),
                pollution_value: value.unwrap_or(f64::NAN),
                parameter: aq.parameter.clone(),
            },
            value.is_some(),
        ));
    }

    let initial_count = joined.len();
    let non_numeric_count = joined.iter().filter(|(_, numeric)| !numeric).count();
    let rows: Vec<ReconciledRow> = joined
        .into_iter()
        .filter(|(row, numeric)| *numeric && row.pollution_value >= 0.0)
        .map(|(row, _)| row)
        .collect();
    let removed_count = initial_count - rows.len();

    counter!(ROWS_REMOVED_TOTAL).increment(removed_count as u64);
    info!(
        "Joined {} countries; removed {} with negative or non-numeric pollution values",
        initial_count, removed_count
    );

    Reconciliation {
        rows,
        removed_count,
        non_numeric_count,
    }
}
