//! Core records shared by readers, normalizer, integrator and stores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three electricity series tracked by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Electric power consumption, kWh per capita.
    ElectricityUsePerCapita,
    /// Renewable electricity output, % of total electricity output.
    RenewablePct,
    /// Transmission and distribution losses, % of output.
    LossPct,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [
        Indicator::ElectricityUsePerCapita,
        Indicator::RenewablePct,
        Indicator::LossPct,
    ];

    /// World Bank indicator code; also the document-store collection name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ElectricityUsePerCapita => "EG.USE.ELEC.KH.PC",
            Self::RenewablePct => "EG.ELC.RNEW.ZS",
            Self::LossPct => "EG.ELC.LOSS.ZS",
        }
    }

    /// Column name in the integrated table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::ElectricityUsePerCapita => "electricity_use_per_capita",
            Self::RenewablePct => "renewable_pct",
            Self::LossPct => "loss_pct",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One observation exactly as a source reader saw it. Nothing is coerced yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawObservation {
    pub country_id: String,
    pub country_name: Option<String>,
    pub year: String,
    pub value: Option<String>,
}

/// A normalized observation keyed by canonical ISO-3 code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub country_code: String,
    pub year: i32,
    pub value: Option<f64>,
}

impl IndicatorRecord {
    pub fn key(&self) -> (&str, i32) {
        (self.country_code.as_str(), self.year)
    }
}

/// Normalized output of one source.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub indicator: Indicator,
    pub records: Vec<IndicatorRecord>,
}

/// One row of the integrated snapshot. Column order matches the persisted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedRow {
    pub country_code: String,
    pub country_name: Option<String>,
    pub year: i32,
    pub electricity_use_per_capita: Option<f64>,
    pub renewable_pct: Option<f64>,
    pub loss_pct: Option<f64>,
}

impl IntegratedRow {
    pub fn empty(country_code: impl Into<String>, country_name: Option<String>, year: i32) -> Self {
        Self {
            country_code: country_code.into(),
            country_name,
            year,
            electricity_use_per_capita: None,
            renewable_pct: None,
            loss_pct: None,
        }
    }

    pub fn value(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::ElectricityUsePerCapita => self.electricity_use_per_capita,
            Indicator::RenewablePct => self.renewable_pct,
            Indicator::LossPct => self.loss_pct,
        }
    }

    pub fn set_value(&mut self, indicator: Indicator, value: Option<f64>) {
        match indicator {
            Indicator::ElectricityUsePerCapita => self.electricity_use_per_capita = value,
            Indicator::RenewablePct => self.renewable_pct = value,
            Indicator::LossPct => self.loss_pct = value,
        }
    }
}

/// The integrated snapshot, ordered by `(country_code, year)` with unique keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntegratedTable {
    pub rows: Vec<IntegratedRow>,
}

impl IntegratedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> Vec<(String, i32)> {
        self.rows
            .iter()
            .map(|row| (row.country_code.clone(), row.year))
            .collect()
    }

    /// Number of rows carrying a value for `indicator`.
    pub fn coverage(&self, indicator: Indicator) -> usize {
        self.rows
            .iter()
            .filter(|row| row.value(indicator).is_some())
            .count()
    }
}
