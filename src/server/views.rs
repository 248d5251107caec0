//! Aggregations behind the dashboard endpoints. All functions are pure over
//! the integrated table; absent values are skipped, never treated as zero.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::data::indicator::{Indicator, IntegratedRow, IntegratedTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryEntry {
    pub country_code: String,
    pub country_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub mean_electricity_use_per_capita: Option<f64>,
    pub mean_renewable_pct: Option<f64>,
    pub mean_loss_pct: Option<f64>,
}

/// Indicator values relative to the first row of the range (= 100).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedPoint {
    pub year: i32,
    pub electricity_use_index: Option<f64>,
    pub renewable_index: Option<f64>,
    pub loss_index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCountry {
    pub rank: usize,
    pub country_code: String,
    pub country_name: Option<String>,
    pub electricity_use_per_capita: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankPoint {
    pub year: i32,
    pub country_code: String,
    pub rank: usize,
}

pub fn countries(table: &IntegratedTable) -> Vec<CountryEntry> {
    let mut seen = HashSet::new();
    table
        .rows
        .iter()
        .filter(|row| seen.insert(row.country_code.as_str()))
        .map(|row| CountryEntry {
            country_code: row.country_code.clone(),
            country_name: row.country_name.clone(),
        })
        .collect()
}

pub fn year_bounds(table: &IntegratedTable) -> Option<(i32, i32)> {
    let min = table.rows.iter().map(|row| row.year).min()?;
    let max = table.rows.iter().map(|row| row.year).max()?;
    Some((min, max))
}

/// Rows of one country within `[from, to]`, ordered by year.
pub fn country_rows<'a>(
    table: &'a IntegratedTable,
    country_code: &str,
    from: Option<i32>,
    to: Option<i32>,
) -> Vec<&'a IntegratedRow> {
    let mut rows: Vec<&IntegratedRow> = table
        .rows
        .iter()
        .filter(|row| row.country_code == country_code)
        .filter(|row| from.map_or(true, |from| row.year >= from))
        .filter(|row| to.map_or(true, |to| row.year <= to))
        .collect();
    rows.sort_by_key(|row| row.year);
    rows
}

pub fn kpis(rows: &[&IntegratedRow]) -> Kpis {
    Kpis {
        mean_electricity_use_per_capita: mean(rows, Indicator::ElectricityUsePerCapita),
        mean_renewable_pct: mean(rows, Indicator::RenewablePct),
        mean_loss_pct: mean(rows, Indicator::LossPct),
    }
}

fn mean(rows: &[&IntegratedRow], indicator: Indicator) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|row| row.value(indicator)).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn indexed_series(rows: &[&IntegratedRow]) -> Vec<IndexedPoint> {
    let Some(base) = rows.first() else {
        return Vec::new();
    };
    let index = |row: &IntegratedRow, indicator: Indicator| {
        let base = base.value(indicator).filter(|value| *value != 0.0)?;
        Some(row.value(indicator)? / base * 100.0)
    };
    rows.iter()
        .map(|row| IndexedPoint {
            year: row.year,
            electricity_use_index: index(row, Indicator::ElectricityUsePerCapita),
            renewable_index: index(row, Indicator::RenewablePct),
            loss_index: index(row, Indicator::LossPct),
        })
        .collect()
}

/// Highest consumption per capita in `year`, countries without a value skipped.
pub fn top_consumers(table: &IntegratedTable, year: i32, limit: usize) -> Vec<RankedCountry> {
    let mut candidates: Vec<(&IntegratedRow, f64)> = table
        .rows
        .iter()
        .filter(|row| row.year == year)
        .filter_map(|row| Some((row, row.electricity_use_per_capita?)))
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(position, (row, value))| RankedCountry {
            rank: position + 1,
            country_code: row.country_code.clone(),
            country_name: row.country_name.clone(),
            electricity_use_per_capita: value,
        })
        .collect()
}

/// Rank of each selected country among the selection, per year, by consumption.
/// Ties keep country-code order.
pub fn rank_history(table: &IntegratedTable, country_codes: &[String]) -> Vec<RankPoint> {
    let selected: HashSet<&str> = country_codes.iter().map(String::as_str).collect();
    let mut by_year: BTreeMap<i32, Vec<(&str, f64)>> = BTreeMap::new();
    for row in &table.rows {
        if !selected.contains(row.country_code.as_str()) {
            continue;
        }
        if let Some(value) = row.electricity_use_per_capita {
            by_year
                .entry(row.year)
                .or_default()
                .push((row.country_code.as_str(), value));
        }
    }

    let mut points = Vec::new();
    for (year, mut entries) in by_year {
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        points.extend(entries.into_iter().enumerate().map(|(position, (code, _))| RankPoint {
            year,
            country_code: code.to_string(),
            rank: position + 1,
        }));
    }
    points
}

/// Left join of boundary features with the rows of `year`. Features are matched
/// on their `id` (or an `ISO_A3`/`iso_a3` property); unmatched features get nulls.
pub fn choropleth(boundaries: &Value, table: &IntegratedTable, year: i32) -> Value {
    let by_code: BTreeMap<&str, &IntegratedRow> = table
        .rows
        .iter()
        .filter(|row| row.year == year)
        .map(|row| (row.country_code.as_str(), row))
        .collect();

    let features: Vec<Value> = boundaries
        .get("features")
        .and_then(Value::as_array)
        .map(|features| {
            features
                .iter()
                .map(|feature| merge_feature(feature, &by_code, year))
                .collect()
        })
        .unwrap_or_default();

    json!({
        "type": "FeatureCollection",
        "year": year,
        "features": features,
    })
}

fn merge_feature(feature: &Value, by_code: &BTreeMap<&str, &IntegratedRow>, year: i32) -> Value {
    let mut feature = feature.clone();
    let code = feature_code(&feature);
    let row = code.as_deref().and_then(|code| by_code.get(code)).copied();

    let mut properties = feature
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);
    properties.insert("country_code".to_string(), json!(code));
    properties.insert("year".to_string(), json!(year));
    properties.insert(
        "country_name".to_string(),
        json!(row.and_then(|row| row.country_name.clone())),
    );
    for indicator in Indicator::ALL {
        properties.insert(
            indicator.column().to_string(),
            json!(row.and_then(|row| row.value(indicator))),
        );
    }

    if let Some(object) = feature.as_object_mut() {
        object.insert("properties".to_string(), Value::Object(properties));
    }
    feature
}

fn feature_code(feature: &Value) -> Option<String> {
    feature
        .get("id")
        .and_then(Value::as_str)
        .or_else(|| {
            let properties = feature.get("properties")?;
            properties
                .get("ISO_A3")
                .or_else(|| properties.get("iso_a3"))
                .and_then(Value::as_str)
        })
        .map(|code| code.trim().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, year: i32, usage: Option<f64>) -> IntegratedRow {
        IntegratedRow {
            electricity_use_per_capita: usage,
            ..IntegratedRow::empty(code, None, year)
        }
    }

    #[test]
    fn mean_skips_absent_values() {
        let a = row("USA", 2019, Some(10.0));
        let b = row("USA", 2020, None);
        let c = row("USA", 2021, Some(20.0));
        let rows = vec![&a, &b, &c];
        assert_eq!(mean(&rows, Indicator::ElectricityUsePerCapita), Some(15.0));
        assert_eq!(mean(&rows, Indicator::LossPct), None);
    }

    #[test]
    fn feature_code_falls_back_to_iso_property() {
        let feature = json!({"type": "Feature", "properties": {"ISO_A3": "fra"}});
        assert_eq!(feature_code(&feature), Some("FRA".to_string()));
        let feature = json!({"type": "Feature", "id": "DEU", "properties": {}});
        assert_eq!(feature_code(&feature), Some("DEU".to_string()));
    }
}
