//! Delimited-text reader for World Bank bulk downloads.
//!
//! Accepts the wide layout (`Country Name, Country Code, ..., 1960, 1961, ...`
//! after a free-text preamble) and a long layout with `year` and `value`
//! columns. The header row is found by looking for a country-code column.

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord};

use crate::data::indicator::{Indicator, RawObservation};
use crate::sources::{FetchError, Fetcher, SourceReader};

const CODE_HEADERS: &[&str] = &["Country Code", "country_code", "iso3", "country_id"];
const NAME_HEADERS: &[&str] = &["Country Name", "country_name", "country"];

#[derive(Debug, Clone)]
pub struct CsvSource {
    indicator: Indicator,
    location: String,
}

impl CsvSource {
    pub fn new(indicator: Indicator, location: impl Into<String>) -> Self {
        Self {
            indicator,
            location: location.into(),
        }
    }
}

#[async_trait]
impl SourceReader for CsvSource {
    fn indicator(&self) -> Indicator {
        self.indicator
    }

    fn location(&self) -> &str {
        &self.location
    }

    async fn read(&self, fetcher: &Fetcher) -> Result<Vec<RawObservation>, FetchError> {
        let text = fetcher.fetch_text(&self.location).await?;
        parse_csv(&text)
    }
}

enum Layout {
    Wide { years: Vec<(usize, String)> },
    Long { year: usize, value: usize },
}

struct Columns {
    code: usize,
    name: Option<usize>,
    layout: Layout,
}

pub fn parse_csv(text: &str) -> Result<Vec<RawObservation>, FetchError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut columns: Option<Columns> = None;
    let mut observations = Vec::new();

    for record in reader.records() {
        let record = record?;
        if columns.is_none() {
            columns = detect_columns(&record)?;
            continue;
        }
        let Some(cols) = columns.as_ref() else {
            continue;
        };

        let country_id = cell(&record, Some(cols.code)).unwrap_or_default();
        let country_name = cell(&record, cols.name).filter(|name| !name.is_empty());

        match &cols.layout {
            Layout::Wide { years } => {
                for (index, year) in years {
                    observations.push(RawObservation {
                        country_id: country_id.clone(),
                        country_name: country_name.clone(),
                        year: year.clone(),
                        value: cell(&record, Some(*index)),
                    });
                }
            }
            Layout::Long { year, value } => observations.push(RawObservation {
                country_id,
                country_name,
                year: cell(&record, Some(*year)).unwrap_or_default(),
                value: cell(&record, Some(*value)),
            }),
        }
    }

    if columns.is_none() {
        return Err(FetchError::format("CSV", "no header row with a country code column"));
    }
    Ok(observations)
}

/// `Ok(None)` while still inside the preamble.
fn detect_columns(record: &StringRecord) -> Result<Option<Columns>, FetchError> {
    let Some(code) = find_column(record, CODE_HEADERS) else {
        return Ok(None);
    };
    let name = find_column(record, NAME_HEADERS);

    let layout = match (find_column(record, &["year"]), find_column(record, &["value"])) {
        (Some(year), Some(value)) => Layout::Long { year, value },
        _ => {
            let years: Vec<(usize, String)> = record
                .iter()
                .enumerate()
                .map(|(index, header)| (index, header.trim().to_string()))
                .filter(|(_, header)| !header.is_empty() && header.chars().all(|c| c.is_ascii_digit()))
                .collect();
            if years.is_empty() {
                return Err(FetchError::format("CSV", "header has neither year columns nor year/value columns"));
            }
            Layout::Wide { years }
        }
    };

    Ok(Some(Columns { code, name, layout }))
}

fn find_column(record: &StringRecord, candidates: &[&str]) -> Option<usize> {
    record.iter().position(|header| {
        candidates
            .iter()
            .any(|candidate| header.trim().eq_ignore_ascii_case(candidate))
    })
}

fn cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .map(|value| value.trim().to_string())
}
