//! Defaults and fixed names shared across the crate.

// Upstream endpoints
pub const OPENAQ_BASE_URL: &str = "https://api.openaq.org/v2";
pub const OPENAQ_COUNTRIES_PATH: &str = "countries";
pub const OPENAQ_MEASUREMENTS_PATH: &str = "measurements";
pub const POPULATION_PAGE_URL: &str =
    "https://en.wikipedia.org/wiki/List_of_countries_and_dependencies_by_population";

// Credentials
pub const API_KEY_ENV: &str = "OPENAQ_API_KEY";
pub const API_KEY_HEADER: &str = "X-API-Key";

// Request shaping
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

// Files
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const COMBINED_OUTPUT: &str = "combined_population_air_quality.csv";
pub const POPULATION_OUTPUT: &str = "cleaned_countries_by_population.csv";
pub const AIR_QUALITY_OUTPUT: &str = "country_pollution_data.csv";
pub const LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "popair.log";
pub const METRICS_SNAPSHOT: &str = "logs/metrics.prom";
