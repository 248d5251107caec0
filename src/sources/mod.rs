//! Source readers: one per wire format, each producing raw observations for a
//! single indicator. A reader failing never affects the others.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::data::indicator::{Indicator, RawObservation};

pub mod csv_source;
pub mod json_source;
pub mod xml_source;

pub use csv_source::CsvSource;
pub use json_source::JsonApiSource;
pub use xml_source::XmlApiSource;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid url '{url}': {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("unexpected {format} layout: {message}")]
    Format {
        format: &'static str,
        message: String,
    },
}

impl FetchError {
    pub(crate) fn format(format: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            format,
            message: message.into(),
        }
    }
}

/// Page header shared by the World Bank JSON and XML APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub page: u32,
    pub pages: u32,
}

/// One fetched page: its header (when the format carries one) and observations.
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub info: Option<PageInfo>,
    pub observations: Vec<RawObservation>,
}

#[async_trait]
pub trait SourceReader: Send + Sync {
    fn indicator(&self) -> Indicator;

    /// Human-readable location, used in logs and reports.
    fn location(&self) -> &str;

    async fn read(&self, fetcher: &Fetcher) -> Result<Vec<RawObservation>, FetchError>;
}

/// Resolves a location to text. `http(s)://` goes through the shared client,
/// anything else is read as a local path.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_pages: u32,
}

impl Fetcher {
    pub fn new(timeout: Duration, max_pages: u32) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("electricity-etl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self {
            client,
            max_pages: max_pages.max(1),
        })
    }

    pub async fn fetch_text(&self, location: &str) -> Result<String, FetchError> {
        let text = if is_remote(location) {
            let http_err = |source| FetchError::Http {
                url: location.to_string(),
                source,
            };
            self.client
                .get(location)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(http_err)?
                .text()
                .await
                .map_err(http_err)?
        } else {
            tokio::fs::read_to_string(Path::new(location))
                .await
                .map_err(|source| FetchError::Read {
                    path: location.to_string(),
                    source,
                })?
        };
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    /// Fetch every page of a paginated World Bank endpoint.
    ///
    /// Local files are parsed once; remote locations follow the `pages`
    /// header of the first page up to `max_pages`.
    pub async fn fetch_paginated<F>(
        &self,
        location: &str,
        parse: F,
    ) -> Result<Vec<RawObservation>, FetchError>
    where
        F: Fn(&str) -> Result<ParsedPage, FetchError> + Send + Sync,
    {
        let first_url = if is_remote(location) {
            page_url(location, 1)?
        } else {
            location.to_string()
        };
        let first = parse(&self.fetch_text(&first_url).await?)?;
        let mut observations = first.observations;

        let pages = match first.info {
            Some(info) if is_remote(location) => info.pages.min(self.max_pages),
            _ => 1,
        };
        if is_remote(location) && first.info.map_or(false, |info| info.pages > self.max_pages) {
            tracing::warn!(location, max_pages = self.max_pages, "page count capped");
        }

        for page in 2..=pages {
            let url = page_url(location, page)?;
            tracing::debug!(%url, page, pages, "fetching page");
            let parsed = parse(&self.fetch_text(&url).await?)?;
            observations.extend(parsed.observations);
        }
        Ok(observations)
    }
}

pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// `location` with its `page` query parameter set to `page`; other parameters keep their order.
pub fn page_url(location: &str, page: u32) -> Result<String, FetchError> {
    let mut url = Url::parse(location).map_err(|source| FetchError::Url {
        url: location.to_string(),
        source,
    })?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_replaces_existing_page_parameter() {
        let url = page_url(
            "https://api.worldbank.org/v2/country/all/indicator/EG.ELC.LOSS.ZS?per_page=20000&page=7",
            3,
        )
        .unwrap();
        assert_eq!(
            url,
            "https://api.worldbank.org/v2/country/all/indicator/EG.ELC.LOSS.ZS?per_page=20000&page=3"
        );
    }

    #[test]
    fn page_url_appends_when_absent() {
        let url = page_url("https://example.org/data?format=json", 2).unwrap();
        assert_eq!(url, "https://example.org/data?format=json&page=2");
    }

    #[test]
    fn remote_detection_is_scheme_based() {
        assert!(is_remote("https://api.worldbank.org/v2"));
        assert!(is_remote("HTTP://example.org"));
        assert!(!is_remote("renewable_electricity.csv"));
        assert!(!is_remote("/tmp/data.xml"));
    }
}
