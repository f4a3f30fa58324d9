use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

use crate::app::ports::{HttpClientPort, HttpRequest};
use crate::error::{FetchError, Result, ScraperError};
use crate::processing::normalize::normalize_name;
use crate::types::PopulationRow;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table.wikitable").unwrap());
static CAPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("caption").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());

const NAME_COLUMN: usize = 1;
const POPULATION_COLUMN: usize = 2;
const SHARE_COLUMN: usize = 3;
const DATE_COLUMN: usize = 4;
const MIN_CELLS: usize = 4;

/// Download the population page and extract its cleaned rows.
#[instrument(skip(http))]
pub async fn fetch_population_rows(http: &dyn HttpClientPort, url: &str) -> Result<Vec<PopulationRow>> {
    let response = http
        .get(&HttpRequest::get(url))
        .await
        .map_err(FetchError::Transport)?;
    if !response.is_success() {
        return Err(FetchError::Upstream {
            status: response.status,
            body: response.text(),
        }
        .into());
    }

    let rows = extract_population_rows(&response.text())?;
    info!("Scraped and cleaned {} population rows", rows.len());
    Ok(rows)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Pick the first `wikitable` whose caption mentions population and read
/// its data rows. Country names come back normalized.
pub fn extract_population_rows(html: &str) -> Result<Vec<PopulationRow>> {
    let document = Html::parse_document(html);

    let tables: Vec<ElementRef<'_>> = document.select(&TABLE).collect();
    if tables.is_empty() {
        return Err(ScraperError::TableNotFound(
            "no table with class 'wikitable'; the page structure may have changed".into(),
        ));
    }
    info!("Found {} tables with class 'wikitable'", tables.len());

    let (index, table, caption) = tables
        .iter()
        .enumerate()
        .find_map(|(i, table)| {
            let caption = element_text(table.select(&CAPTION).next()?);
            caption
                .to_lowercase()
                .contains("population")
                .then_some((i, *table, caption))
        })
        .ok_or_else(|| {
            ScraperError::TableNotFound("no wikitable caption mentions population".into())
        })?;
    info!("Using table {} with caption: {}", index + 1, caption);

    let mut rows = Vec::new();
    // First row is the header
    for tr in table.select(&ROW).skip(1) {
        let cells: Vec<String> = tr.select(&CELL).map(element_text).collect();
        if cells.len() < MIN_CELLS {
            debug!("Skipping row with {} cells", cells.len());
            continue;
        }

        let country = &cells[NAME_COLUMN];
        if country.is_empty() {
            continue;
        }

        rows.push(PopulationRow {
            country_name: normalize_name(country),
            population: cells[POPULATION_COLUMN].replace(',', ""),
            population_share: cells[SHARE_COLUMN].clone(),
            date: cells.get(DATE_COLUMN).filter(|d| !d.is_empty()).cloned(),
        });
    }

    Ok(rows)
}
