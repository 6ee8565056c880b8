// Investing.com historical data page
//
// Second table on the page; first cell carries the date in a
// `dateTime="May 01, 2024"` attribute, third cell is the opening value.

use crate::error::SourceError;
use crate::sources::fetcher::PageFetcher;
use crate::sources::{html, DowSource};
use crate::types::Observation;
use async_trait::async_trait;
use chrono::NaiveDate;

const INVESTING_URL: &str = "https://www.investing.com/indices/us-30-historical-data";
const SOURCE_ID: &str = "investing";
const DATE_ATTR: &str = "dateTime=\"";

pub struct InvestingSource {
    fetcher: PageFetcher,
}

impl InvestingSource {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

/// Extract (date, open) rows from an Investing.com page
pub fn parse_investing(page: &str) -> Result<Vec<Observation>, SourceError> {
    let tables = html::tables(page);
    let table = tables
        .get(1)
        .ok_or_else(|| SourceError::Layout("investing: history table missing".to_string()))?;

    let mut observations = Vec::new();
    for row in html::rows(table) {
        let cells = html::cells(row);
        if cells.is_empty() {
            continue;
        }
        if cells.len() < 3 {
            return Err(SourceError::Layout(format!(
                "investing: expected at least 3 cells, got {}",
                cells.len()
            )));
        }

        let start = cells[0]
            .find(DATE_ATTR)
            .ok_or_else(|| {
                SourceError::Layout("investing: dateTime attribute missing".to_string())
            })?
            + DATE_ATTR.len();
        let end = cells[0][start..]
            .find('"')
            .map(|i| start + i)
            .ok_or_else(|| SourceError::Layout("investing: unterminated dateTime".to_string()))?;

        let raw_date = &cells[0][start..end];
        let date = NaiveDate::parse_from_str(raw_date, "%b %d, %Y")
            .map_err(|e| SourceError::Parse(format!("investing date '{}': {}", raw_date, e)))?;

        observations.push(Observation::new(date, cells[2], SOURCE_ID));
    }

    Ok(observations)
}

#[async_trait]
impl DowSource for InvestingSource {
    fn source_id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let page = self.fetcher.get_text(INVESTING_URL).await?;
        parse_investing(&page)
    }
}
