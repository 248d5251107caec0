//! Turns raw source observations into canonical `IndicatorRecord`s.
//!
//! Unmapped country identifiers are dropped (never defaulted), missing-value
//! markers become `None` (never zero), and a repeated `(country_code, year)`
//! within one source keeps the last value seen.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::data::aliases::CountryAliases;
use crate::data::indicator::{Indicator, IndicatorRecord, NormalizedSeries, RawObservation};

const MISSING_MARKERS: &[&str] = &["", "..", "NA", "N/A", "NULL", "NAN", "-"];
const MAX_UNMAPPED_LISTED: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub invalid_year: usize,
    pub duplicates_replaced: usize,
    pub absent_values: usize,
    /// Distinct unmapped identifiers, capped so aggregates do not flood the report.
    pub unmapped_ids: Vec<String>,
}

pub struct Normalizer<'a> {
    aliases: &'a CountryAliases,
}

impl<'a> Normalizer<'a> {
    pub fn new(aliases: &'a CountryAliases) -> Self {
        Self { aliases }
    }

    pub fn normalize<I>(&self, indicator: Indicator, observations: I) -> (NormalizedSeries, NormalizeReport)
    where
        I: IntoIterator<Item = RawObservation>,
    {
        let mut report = NormalizeReport::default();
        let mut unmapped_ids = BTreeSet::new();
        let mut by_key: BTreeMap<(String, i32), Option<f64>> = BTreeMap::new();

        for observation in observations {
            report.total += 1;

            let Some(code) = self.aliases.resolve(&observation.country_id) else {
                report.unmapped += 1;
                unmapped_ids.insert(observation.country_id.trim().to_string());
                continue;
            };

            let Some(year) = parse_year(&observation.year) else {
                report.invalid_year += 1;
                continue;
            };

            report.mapped += 1;
            if by_key
                .insert((code.to_string(), year), parse_value(observation.value.as_deref()))
                .is_some()
            {
                report.duplicates_replaced += 1;
            }
        }

        let records: Vec<IndicatorRecord> = by_key
            .into_iter()
            .map(|((country_code, year), value)| IndicatorRecord {
                country_code,
                year,
                value,
            })
            .collect();

        report.absent_values = records.iter().filter(|r| r.value.is_none()).count();
        report.unmapped_ids = unmapped_ids
            .into_iter()
            .take(MAX_UNMAPPED_LISTED)
            .collect();

        (NormalizedSeries { indicator, records }, report)
    }
}

pub fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

/// Numeric coercion for indicator values. Sentinels and garbage map to `None`.
pub fn parse_value(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if MISSING_MARKERS
        .iter()
        .any(|marker| marker.eq_ignore_ascii_case(trimmed))
    {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
