//! World Bank v2 XML API reader.
//!
//! ```text
//! <wb:data page="1" pages="3" per_page="1000" total="17290">
//!   <wb:data>
//!     <wb:country id="US">United States</wb:country>
//!     <wb:countryiso3code>USA</wb:countryiso3code>
//!     <wb:date>2020</wb:date>
//!     <wb:value>5.9</wb:value>
//!   </wb:data>
//! </wb:data>
//! ```
//!
//! Records are pulled one at a time from the event stream. The identifier is
//! `countryiso3code`, falling back to the `id` attribute of `wb:country`.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::data::indicator::{Indicator, RawObservation};
use crate::sources::{FetchError, Fetcher, PageInfo, ParsedPage, SourceReader};

#[derive(Debug, Clone)]
pub struct XmlApiSource {
    indicator: Indicator,
    location: String,
}

impl XmlApiSource {
    pub fn new(indicator: Indicator, location: impl Into<String>) -> Self {
        Self {
            indicator,
            location: location.into(),
        }
    }
}

#[async_trait]
impl SourceReader for XmlApiSource {
    fn indicator(&self) -> Indicator {
        self.indicator
    }

    fn location(&self) -> &str {
        &self.location
    }

    async fn read(&self, fetcher: &Fetcher) -> Result<Vec<RawObservation>, FetchError> {
        fetcher.fetch_paginated(&self.location, parse_xml_page).await
    }
}

pub fn parse_xml_page(text: &str) -> Result<ParsedPage, FetchError> {
    let mut records = XmlRecords::new(text);
    let observations = records.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok(ParsedPage {
        info: records.page_info(),
        observations,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Country,
    CountryIso3,
    Date,
    Value,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"country" => Some(Self::Country),
            b"countryiso3code" => Some(Self::CountryIso3),
            b"date" => Some(Self::Date),
            b"value" => Some(Self::Value),
            _ => None,
        }
    }

    fn assign(self, record: &mut RawObservation, text: String) {
        match self {
            Self::Country => record.country_name = Some(text).filter(|t| !t.is_empty()),
            Self::CountryIso3 => record.country_id = text,
            Self::Date => record.year = text,
            Self::Value => record.value = Some(text),
        }
    }
}

/// Pull-based iterator over the records of one XML page.
pub struct XmlRecords<'a> {
    reader: Reader<&'a [u8]>,
    depth: usize,
    info: Option<PageInfo>,
    error: Option<String>,
    finished: bool,
}

impl<'a> XmlRecords<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            depth: 0,
            info: None,
            error: None,
            finished: false,
        }
    }

    /// Page header of the root element, once it has been read.
    pub fn page_info(&self) -> Option<PageInfo> {
        self.info
    }

    fn next_record(&mut self) -> Result<Option<RawObservation>, FetchError> {
        let mut record: Option<RawObservation> = None;
        let mut country_attr: Option<String> = None;
        let mut field: Option<Field> = None;
        let mut text = String::new();

        loop {
            let event = self.reader.read_event()?;
            match event {
                Event::Start(ref element) | Event::Empty(ref element) => {
                    let self_closing = matches!(event, Event::Empty(_));
                    let depth = self.depth + 1;
                    let name = element.local_name();
                    match (depth, name.as_ref()) {
                        (1, b"error") => self.error = Some(String::new()),
                        (1, _) => self.info = page_info(element)?,
                        (2, b"data") if !self_closing => record = Some(RawObservation::default()),
                        (3, local) if record.is_some() => {
                            field = Field::from_local_name(local);
                            text.clear();
                            if field == Some(Field::Country) {
                                country_attr = attr_value(element, b"id")?;
                            }
                        }
                        _ => {}
                    }
                    if self_closing {
                        field = None;
                    } else {
                        self.depth = depth;
                    }
                }
                Event::Text(ref content) => {
                    if let Some(message) = self.error.as_mut() {
                        message.push_str(&content.unescape()?);
                    } else if field.is_some() {
                        text.push_str(&content.unescape()?);
                    }
                }
                Event::End(_) => {
                    let depth = self.depth;
                    self.depth = self.depth.saturating_sub(1);
                    match depth {
                        3 => {
                            if let (Some(current), Some(done)) = (record.as_mut(), field.take()) {
                                done.assign(current, std::mem::take(&mut text));
                            }
                        }
                        2 => {
                            if let Some(mut current) = record.take() {
                                if current.country_id.trim().is_empty() {
                                    current.country_id = country_attr.take().unwrap_or_default();
                                }
                                return Ok(Some(current));
                            }
                        }
                        1 => {
                            if let Some(message) = self.error.take() {
                                return Err(FetchError::format(
                                    "XML",
                                    format!("API error: {}", message.trim()),
                                ));
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for XmlRecords<'_> {
    type Item = Result<RawObservation, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

fn page_info(element: &BytesStart<'_>) -> Result<Option<PageInfo>, FetchError> {
    let page = attr_value(element, b"page")?.and_then(|v| v.trim().parse().ok());
    let pages = attr_value(element, b"pages")?.and_then(|v| v.trim().parse().ok());
    Ok(page.zip(pages).map(|(page, pages)| PageInfo { page, pages }))
}

fn attr_value(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, FetchError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
