use async_trait::async_trait;
use popair_scraper::app::ports::{HttpClientPort, HttpGetResult, HttpRequest};
use popair_scraper::config::{ApiKey, Config};
use popair_scraper::error::ScraperError;
use popair_scraper::pipeline::Pipeline;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

const POPULATION_URL: &str = "http://wiki.test/population";
const API_URL: &str = "http://api.test/v2";

const POPULATION_PAGE: &str = r#"
<html><body>
<table class="wikitable sortable">
  <caption>List of countries by population</caption>
  <tr><th>#</th><th>Location</th><th>Population</th><th>%</th><th>Date</th></tr>
  <tr><td>1</td><td>France[1]</td><td>68,000,000</td><td>0.8%</td><td>2024</td></tr>
  <tr><td>2</td><td>Chad</td><td>18,000,000</td><td>0.2%</td><td>2024</td></tr>
  <tr><td>3</td><td>Peru</td><td>34,000,000</td><td>0.4%</td><td>2024</td></tr>
  <tr><td>4</td><td>India</td><td>1,425,775,850</td><td>17.7%</td><td>2023</td></tr>
</table>
</body></html>
"#;

/// Answers by URL plus the `page`/`country` query parameter.
#[derive(Default)]
struct RoutedHttp {
    routes: HashMap<String, (u16, String)>,
    calls: Mutex<Vec<String>>,
}

impl RoutedHttp {
    fn route_key(url: &str, request_param: Option<&str>) -> String {
        match request_param {
            Some(p) => format!("{}?{}", url, p),
            None => url.to_string(),
        }
    }

    fn with(mut self, url: &str, param: Option<&str>, status: u16, body: impl ToString) -> Self {
        self.routes
            .insert(Self::route_key(url, param), (status, body.to_string()));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClientPort for RoutedHttp {
    async fn get(&self, request: &HttpRequest) -> Result<HttpGetResult, String> {
        let param = request
            .query_value("country")
            .map(|c| format!("country={}", c))
            .or_else(|| request.query_value("page").map(|p| format!("page={}", p)));
        let key = Self::route_key(&request.url, param.as_deref());
        self.calls.lock().unwrap().push(key.clone());

        let (status, body) = self
            .routes
            .get(&key)
            .cloned()
            .ok_or_else(|| format!("no route for {}", key))?;
        Ok(HttpGetResult {
            status,
            bytes: body.into_bytes(),
        })
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.population.url = POPULATION_URL.to_string();
    config.openaq.base_url = API_URL.to_string();
    config.openaq.page_size = 2;
    config.openaq.max_retries = 2;
    config.openaq.retry_delay_secs = 0;
    config
}

fn api_key() -> ApiKey {
    ApiKey::from_value(Some("integration-key".into())).unwrap()
}

fn measurement(parameter: &str, value: serde_json::Value) -> serde_json::Value {
    json!({ "results": [{ "parameter": parameter, "value": value, "date": { "utc": "2024-09-01T00:00:00Z" } }] })
}

fn countries_url() -> String {
    format!("{}/countries", API_URL)
}

fn measurements_url() -> String {
    format!("{}/measurements", API_URL)
}

#[tokio::test]
async fn test_full_pipeline_writes_merged_csv() {
    let http = RoutedHttp::default()
        .with(POPULATION_URL, None, 200, POPULATION_PAGE)
        .with(
            &countries_url(),
            Some("page=1"),
            200,
            json!({ "results": [{ "code": "FR", "name": "France" }, { "code": "TD", "name": "Chad" }] }),
        )
        .with(
            &countries_url(),
            Some("page=2"),
            200,
            json!({ "results": [{ "code": "PE", "name": "Peru" }] }),
        )
        .with(&measurements_url(), Some("country=FR"), 200, measurement("pm25", json!(12.5)))
        .with(&measurements_url(), Some("country=TD"), 200, measurement("pm10", json!(-3)))
        .with(&measurements_url(), Some("country=PE"), 500, "internal error");
    let http = Arc::new(http);

    let dir = tempdir().unwrap();
    let output = dir.path().join("combined.csv");

    let pipeline = Pipeline::new(http.clone(), test_config());
    let result = pipeline.run(api_key(), &output).await.unwrap();

    assert_eq!(result.population_rows, 4);
    assert_eq!(result.countries, 3);
    assert_eq!(result.measurements, 2);
    assert_eq!(result.reconciled_rows, 1);
    assert_eq!(result.removed_rows, 1);
    assert!(result.empty_stage.is_none());
    assert_eq!(result.output_file.as_deref(), Some(output.display().to_string().as_str()));

    let csv = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        csv,
        "country_name,population,population_share,pollution_value,parameter\n\
         France,68000000,0.8%,12.5,pm25\n"
    );

    // Population page first, then pages, then one measurement per country in order
    let calls = http.calls();
    assert_eq!(calls[0], POPULATION_URL);
    assert_eq!(calls[1], format!("{}?page=1", countries_url()));
    assert_eq!(calls[2], format!("{}?page=2", countries_url()));
    assert_eq!(calls.len(), 6);
}

#[tokio::test]
async fn test_no_countries_exits_cleanly_without_output() {
    let http = RoutedHttp::default()
        .with(POPULATION_URL, None, 200, POPULATION_PAGE)
        .with(&countries_url(), Some("page=1"), 401, "unauthorized");

    let dir = tempdir().unwrap();
    let output = dir.path().join("combined.csv");

    let pipeline = Pipeline::new(Arc::new(http), test_config());
    let result = pipeline.run(api_key(), &output).await.unwrap();

    assert_eq!(result.empty_stage, Some("countries from the air-quality API"));
    assert!(result.output_file.is_none());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_everything_filtered_writes_nothing() {
    let http = RoutedHttp::default()
        .with(POPULATION_URL, None, 200, POPULATION_PAGE)
        .with(
            &countries_url(),
            Some("page=1"),
            200,
            json!({ "results": [{ "code": "FR", "name": "france" }] }),
        )
        .with(&measurements_url(), Some("country=FR"), 200, measurement("pm25", json!(-3)));

    let dir = tempdir().unwrap();
    let output = dir.path().join("combined.csv");

    let result = Pipeline::new(Arc::new(http), test_config())
        .run(api_key(), &output)
        .await
        .unwrap();

    assert_eq!(result.removed_rows, 1);
    assert_eq!(result.reconciled_rows, 0);
    assert_eq!(result.empty_stage, Some("rows after merging"));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_population_table_is_fatal() {
    let http = RoutedHttp::default().with(POPULATION_URL, None, 200, "<html><p>moved</p></html>");

    let dir = tempdir().unwrap();
    let err = Pipeline::new(Arc::new(http), test_config())
        .run(api_key(), &dir.path().join("combined.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::TableNotFound(_)));
}

#[tokio::test]
async fn test_population_only_run() {
    let http = RoutedHttp::default().with(POPULATION_URL, None, 200, POPULATION_PAGE);

    let dir = tempdir().unwrap();
    let output = dir.path().join("population.csv");
    let written = Pipeline::new(Arc::new(http), test_config())
        .run_population(&output)
        .await
        .unwrap();

    assert_eq!(written, 4);
    let csv = std::fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with(
        "country_name,population,population_share,date\nFrance,68000000,0.8%,2024\n"
    ));
}

#[tokio::test]
async fn test_air_quality_only_run() {
    let http = RoutedHttp::default()
        .with(
            &countries_url(),
            Some("page=1"),
            200,
            json!({ "results": [{ "code": "FR", "name": "France" }] }),
        )
        .with(&measurements_url(), Some("country=FR"), 200, measurement("pm25", json!(12.5)));

    let dir = tempdir().unwrap();
    let output = dir.path().join("air.csv");
    let written = Pipeline::new(Arc::new(http), test_config())
        .run_air_quality(api_key(), &output)
        .await
        .unwrap();

    assert_eq!(written, 1);
    let csv = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        csv,
        "country_name,pollution_value,parameter,timestamp\nFrance,12.5,pm25,2024-09-01T00:00:00Z\n"
    );
}

#[tokio::test]
async fn test_air_quality_only_run_without_countries() {
    let http = Arc::new(RoutedHttp::default().with(
        &countries_url(),
        Some("page=1"),
        200,
        json!({ "results": [] }),
    ));

    let dir = tempdir().unwrap();
    let output = dir.path().join("air.csv");
    let err = Pipeline::new(http.clone(), test_config())
        .run_air_quality(api_key(), &output)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScraperError::EmptyResult("countries from the air-quality API")
    ));
    assert_eq!(http.calls(), vec![format!("{}?page=1", countries_url())]);
    assert!(!output.exists());
}
