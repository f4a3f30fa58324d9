pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod types;

pub mod ingestion;
pub mod processing;
pub mod scrapers;

// Ports and their adapters
pub mod app;
pub mod infra;

#[cfg(test)]
pub(crate) mod test_support;
