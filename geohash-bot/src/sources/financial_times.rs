// Financial Times tearsheet history page
//
// First table; first cell holds `<span>Wednesday, May 01, 2024</span>`,
// second cell is the opening value.

use crate::error::SourceError;
use crate::sources::fetcher::PageFetcher;
use crate::sources::{html, DowSource};
use crate::types::Observation;
use async_trait::async_trait;
use chrono::NaiveDate;

const FT_URL: &str = "https://markets.ft.com/data/indices/tearsheet/historical?s=DJI:DJI";
const SOURCE_ID: &str = "financial_times";

pub struct FinancialTimesSource {
    fetcher: PageFetcher,
}

impl FinancialTimesSource {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

/// Extract (date, open) rows from a Financial Times page
pub fn parse_financial_times(page: &str) -> Result<Vec<Observation>, SourceError> {
    let tables = html::tables(page);
    let table = tables
        .first()
        .ok_or_else(|| SourceError::Layout("ft: history table missing".to_string()))?;

    let mut observations = Vec::new();
    for row in html::rows(table) {
        let cells = html::cells(row);
        if cells.is_empty() {
            continue;
        }
        if cells.len() < 2 {
            return Err(SourceError::Layout(format!(
                "ft: expected at least 2 cells, got {}",
                cells.len()
            )));
        }

        let raw_date = html::first_span(cells[0])
            .ok_or_else(|| SourceError::Layout("ft: date span missing".to_string()))?;
        let date = NaiveDate::parse_from_str(raw_date.trim(), "%A, %B %d, %Y")
            .map_err(|e| SourceError::Parse(format!("ft date '{}': {}", raw_date, e)))?;

        observations.push(Observation::new(date, cells[1], SOURCE_ID));
    }

    Ok(observations)
}

#[async_trait]
impl DowSource for FinancialTimesSource {
    fn source_id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        let page = self.fetcher.get_text(FT_URL).await?;
        parse_financial_times(&page)
    }
}
