//! Minimal regex-based HTML table slicing
//!
//! Pages are scraped, not parsed: these helpers only cut out table, row and
//! cell bodies, which is all the adapters need.

use once_cell::sync::Lazy;
use regex::Regex;

static TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<table[^>]*>(.*?)</table>").unwrap());
static ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").unwrap());
static CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<td[^>]*>(.*?)</td>").unwrap());
static SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<span[^>]*>(.*?)</span>").unwrap());

fn captures<'a>(re: &Regex, text: &'a str) -> Vec<&'a str> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Bodies of every `<table>` in document order
pub fn tables(html: &str) -> Vec<&str> {
    captures(&TABLE, html)
}

/// Bodies of every `<tr>` in a table
pub fn rows(table: &str) -> Vec<&str> {
    captures(&ROW, table)
}

/// Bodies of every `<td>` in a row (header rows yield none)
pub fn cells(row: &str) -> Vec<&str> {
    captures(&CELL, row)
}

/// Body of the first `<span>` in a fragment
pub fn first_span(fragment: &str) -> Option<&str> {
    SPAN.captures(fragment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
