use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::backoff::{BackoffFetcher, RetryPolicy};

/// Walk a `page`/`limit` listing endpoint from page 1 until a short page.
///
/// The first failed page ends the walk and whatever was gathered so far is
/// returned. An empty first page is ordinary termination. Entries that do
/// not fit `T` are skipped one by one; the short-page check counts every
/// entry the API returned.
pub async fn collect_all<T: DeserializeOwned>(
    fetcher: &BackoffFetcher,
    endpoint: &str,
    page_size: u32,
    policy: &RetryPolicy,
) -> Vec<T> {
    let page_size = page_size.max(1);
    let mut items = Vec::new();
    let mut page = 1u32;

    loop {
        let params = [("limit", page_size.to_string()), ("page", page.to_string())];
        let body = match fetcher.fetch_one(endpoint, &params, policy).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Error fetching page {}: {}", page, e);
                break;
            }
        };

        let results = match body {
            Value::Object(mut map) => match map.remove("results") {
                Some(Value::Array(results)) => results,
                _ => {
                    warn!("Page {} has no results array", page);
                    break;
                }
            },
            _ => {
                warn!("Page {} is not a JSON object", page);
                break;
            }
        };

        let count = results.len();
        for (index, entry) in results.into_iter().enumerate() {
            match serde_json::from_value::<T>(entry) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping entry {} on page {}: {}", index, page, e),
            }
        }
        debug!("Page {} returned {} results", page, count);

        if count < page_size as usize {
            break;
        }
        page += 1;
    }

    info!("Collected {} items from {} ({} page requests)", items.len(), endpoint, page);
    items
}
