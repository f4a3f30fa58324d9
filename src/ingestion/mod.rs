// Ingestion: rate-limited API access and pagination

pub mod backoff;
pub mod openaq;
pub mod paginate;

pub use backoff::{BackoffFetcher, RetryPolicy};
pub use openaq::OpenAqClient;
pub use paginate::collect_all;
