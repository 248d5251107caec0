use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AppConfig;
use crate::data::indicator::IntegratedTable;
use crate::server::views;
use crate::store::{SqliteSnapshotStore, StoreError};

const DEFAULT_RANKING_LIMIT: usize = 10;
const MAX_RANKING_LIMIT: usize = 250;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to load snapshot: {0}")]
    Snapshot(#[from] StoreError),
    #[error("failed to read boundary file '{path}': {source}")]
    BoundaryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse boundary file '{path}': {source}")]
    BoundaryParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("boundary file is not a GeoJSON FeatureCollection")]
    InvalidBoundaries,
    #[error("server i/o: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Snapshot plus geographic boundaries, loaded once when the server starts.
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: IntegratedTable,
    boundaries: Value,
}

impl Dashboard {
    pub fn new(table: IntegratedTable, boundaries: Value) -> Result<Self, DashboardError> {
        let is_collection = boundaries.get("type").and_then(Value::as_str) == Some("FeatureCollection")
            && boundaries.get("features").map_or(false, Value::is_array);
        if !is_collection {
            return Err(DashboardError::InvalidBoundaries);
        }
        Ok(Self { table, boundaries })
    }

    pub fn load(config: &AppConfig) -> Result<Self, DashboardError> {
        let store = SqliteSnapshotStore::new(&config.sqlite.path, &config.sqlite.table)?;
        let table = store.load()?;
        let boundaries = load_boundaries(&config.dashboard.geojson)?;
        Self::new(table, boundaries)
    }

    pub fn table(&self) -> &IntegratedTable {
        &self.table
    }
}

pub fn load_boundaries(path: &Path) -> Result<Value, DashboardError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| DashboardError::BoundaryRead {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DashboardError::BoundaryParse {
        path: display,
        source,
    })
}

pub fn health_payload(dashboard: &Dashboard) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "status": "ok",
        "service": "electricity-dashboard",
        "version": env!("CARGO_PKG_VERSION"),
        "rows": dashboard.table.len(),
    }))
}

pub fn countries_payload(dashboard: &Dashboard) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "countries": views::countries(&dashboard.table) }))
}

pub fn years_payload(dashboard: &Dashboard) -> Result<String, serde_json::Error> {
    let bounds = views::year_bounds(&dashboard.table);
    serde_json::to_string_pretty(&json!({
        "min_year": bounds.map(|(min, _)| min),
        "max_year": bounds.map(|(_, max)| max),
    }))
}

/// `?country=ISO3&from=YYYY&to=YYYY`
pub fn series_payload(dashboard: &Dashboard, path: &str) -> Result<String, ApiError> {
    let params = query_params(path);
    let country = params
        .get("country")
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing 'country' parameter".to_string()))?;
    let from = int_param(&params, "from")?;
    let to = int_param(&params, "to")?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ApiError::BadRequest(format!("'from' ({from}) is after 'to' ({to})")));
        }
    }

    if !dashboard.table.rows.iter().any(|row| row.country_code == country) {
        return Err(ApiError::NotFound(format!("no data for country '{country}'")));
    }

    let rows = views::country_rows(&dashboard.table, &country, from, to);
    let payload = json!({
        "country_code": country,
        "country_name": rows.first().and_then(|row| row.country_name.clone()),
        "from": from,
        "to": to,
        "kpis": views::kpis(&rows),
        "rows": rows,
        "indexed": views::indexed_series(&rows),
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// `?year=YYYY&limit=N`; year defaults to the latest in the snapshot.
pub fn ranking_payload(dashboard: &Dashboard, path: &str) -> Result<String, ApiError> {
    let params = query_params(path);
    let year = resolve_year(dashboard, &params)?;
    let limit = match params.get("limit") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ApiError::BadRequest(format!("invalid 'limit' value '{raw}'")))?
            .clamp(1, MAX_RANKING_LIMIT),
        None => DEFAULT_RANKING_LIMIT,
    };

    let top = views::top_consumers(&dashboard.table, year, limit);
    let codes: Vec<String> = top.iter().map(|entry| entry.country_code.clone()).collect();
    let payload = json!({
        "year": year,
        "top": top,
        "rank_history": views::rank_history(&dashboard.table, &codes),
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// `?year=YYYY`; GeoJSON with the year's values merged into feature properties.
pub fn map_payload(dashboard: &Dashboard, path: &str) -> Result<String, ApiError> {
    let params = query_params(path);
    let year = resolve_year(dashboard, &params)?;
    let payload = views::choropleth(&dashboard.boundaries, &dashboard.table, year);
    Ok(serde_json::to_string(&payload)?)
}

fn resolve_year(dashboard: &Dashboard, params: &HashMap<String, String>) -> Result<i32, ApiError> {
    match int_param(params, "year")? {
        Some(year) => Ok(year),
        None => views::year_bounds(&dashboard.table)
            .map(|(_, max)| max)
            .ok_or_else(|| ApiError::NotFound("snapshot is empty".to_string())),
    }
}

fn query_params(path: &str) -> HashMap<String, String> {
    let query = path.split_once('?').map(|(_, query)| query).unwrap_or("");
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn int_param(params: &HashMap<String, String>, name: &str) -> Result<Option<i32>, ApiError> {
    params
        .get(name)
        .map(|raw| {
            raw.trim()
                .parse::<i32>()
                .map_err(|_| ApiError::BadRequest(format!("invalid '{name}' value '{raw}'")))
        })
        .transpose()
}
