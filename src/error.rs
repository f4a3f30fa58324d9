use thiserror::Error;

/// Failure of a single logical API call. Per-entity failures are absorbed by
/// the caller, so these never abort a batch on their own.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("rate limited on all {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Population table not found: {0}")]
    TableNotFound(String),

    #[error("No {0} to work with")]
    EmptyResult(&'static str),
}

impl ScraperError {
    /// Empty upstream collections end a run early without failing it.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, ScraperError::EmptyResult(_))
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
