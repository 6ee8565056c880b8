// Business Insider index page
//
// The page embeds `historicalPrices: {...}` as a single line of JSON; the
// first `model` row is the latest session.

use crate::error::SourceError;
use crate::sources::fetcher::PageFetcher;
use crate::sources::DowSource;
use crate::types::Observation;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

const BUSINESS_INSIDER_URL: &str = "https://markets.businessinsider.com/index/dow_jones?op=1";
const SOURCE_ID: &str = "business_insider";
const MARKER: &str = "historicalPrices:";

#[derive(Debug, Deserialize)]
struct HistoricalPrices {
    model: Vec<PriceRow>,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Value,
}

pub struct BusinessInsiderSource {
    fetcher: PageFetcher,
}

impl BusinessInsiderSource {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

/// Render the `Open` field the way the table-based sources print it
fn open_value(open: &Value) -> Result<String, SourceError> {
    match open {
        Value::String(s) => Ok(s.clone()),
        // Quotes are to the cent; keep the trailing zero ("38337.40")
        Value::Number(n) => n
            .as_f64()
            .map(|v| format!("{:.2}", v))
            .ok_or_else(|| SourceError::Parse(format!("business insider open '{}'", n))),
        other => Err(SourceError::Parse(format!(
            "business insider open has unexpected type: {}",
            other
        ))),
    }
}

/// Extract the latest (date, open) pair from a Business Insider page
pub fn parse_business_insider(page: &str) -> Result<Vec<Observation>, SourceError> {
    let start = page
        .find(MARKER)
        .ok_or_else(|| {
            SourceError::Layout("business insider: historicalPrices missing".to_string())
        })?
        + MARKER.len();
    let line_end = page[start..]
        .find('\n')
        .map(|i| start + i)
        .unwrap_or(page.len());

    let json = page[start..line_end].trim().trim_end_matches(',');
    let prices: HistoricalPrices = serde_json::from_str(json)
        .map_err(|e| SourceError::Parse(format!("business insider json: {}", e)))?;

    let row = prices
        .model
        .first()
        .ok_or_else(|| SourceError::Layout("business insider: empty price model".to_string()))?;

    let date = NaiveDate::parse_from_str(&row.date, "%m/%d/%y")
        .map_err(|e| SourceError::Parse(format!("business insider date '{}': {}", row.date, e)))?;

    Ok(vec![Observation::new(date, &open_value(&row.open)?, SOURCE_ID)])
}

#[async_trait]
impl DowSource for BusinessInsiderSource {
    fn source_id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let page = self.fetcher.get_text(BUSINESS_INSIDER_URL).await?;
        parse_business_insider(&page)
    }
}
