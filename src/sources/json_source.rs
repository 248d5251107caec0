//! World Bank v2 JSON API reader.
//!
//! A page is `[ header, entries ]` where the header carries `page`/`pages`
//! and `entries` may be `null` when the query matched nothing. An error
//! envelope (`[ { "message": [...] } ]`) is a format failure.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::data::indicator::{Indicator, RawObservation};
use crate::sources::{FetchError, Fetcher, PageInfo, ParsedPage, SourceReader};

#[derive(Debug, Clone)]
pub struct JsonApiSource {
    indicator: Indicator,
    location: String,
}

impl JsonApiSource {
    pub fn new(indicator: Indicator, location: impl Into<String>) -> Self {
        Self {
            indicator,
            location: location.into(),
        }
    }
}

#[async_trait]
impl SourceReader for JsonApiSource {
    fn indicator(&self) -> Indicator {
        self.indicator
    }

    fn location(&self) -> &str {
        &self.location
    }

    async fn read(&self, fetcher: &Fetcher) -> Result<Vec<RawObservation>, FetchError> {
        fetcher.fetch_paginated(&self.location, parse_json_page).await
    }
}

#[derive(Debug, Default, Deserialize)]
struct IdValue {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonEntry {
    #[serde(default)]
    country: Option<IdValue>,
    #[serde(default, rename = "countryiso3code")]
    country_iso3: Option<String>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
}

pub fn parse_json_page(text: &str) -> Result<ParsedPage, FetchError> {
    let payload: Value = serde_json::from_str(text)?;
    let Value::Array(parts) = payload else {
        return Err(FetchError::format("JSON", "expected a top-level array"));
    };

    let mut parts = parts.into_iter();
    let header = parts.next();
    if let Some(message) = header.as_ref().and_then(|h| h.get("message")) {
        return Err(FetchError::format("JSON", format!("API error: {message}")));
    }

    let info = header.as_ref().and_then(|h| {
        Some(PageInfo {
            page: as_u32(h.get("page")?)?,
            pages: as_u32(h.get("pages")?)?,
        })
    });

    let entries = match parts.next() {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(FetchError::format(
                "JSON",
                format!("expected an entry array, found {}", type_name(&other)),
            ))
        }
    };

    let mut skipped = 0usize;
    let observations = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<JsonEntry>(entry) {
            Ok(entry) => Some(entry_to_observation(entry)),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        tracing::warn!(skipped, "skipped JSON entries that are not objects");
    }

    Ok(ParsedPage { info, observations })
}

fn entry_to_observation(entry: JsonEntry) -> RawObservation {
    let (country_id, country_name) = match entry.country {
        Some(IdValue { id, value }) => (id.unwrap_or_default(), value),
        None => (String::new(), None),
    };
    let country_id = if country_id.trim().is_empty() {
        entry.country_iso3.unwrap_or_default()
    } else {
        country_id
    };

    RawObservation {
        country_id,
        country_name,
        year: entry.date.and_then(scalar_text).unwrap_or_default(),
        value: entry.value.and_then(scalar_text),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
