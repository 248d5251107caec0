//! One forward pass: fetch the three sources concurrently, normalize each,
//! join them, then write the relational snapshot and the document collections.
//!
//! A failed source leaves its indicator column empty; only a run where every
//! source failed (or any, with `fail_fast`) stops before touching the stores.
//! Store writes are independent and never rolled back.

use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AppConfig, SourceConfig, SourceFormat};
use crate::data::aliases::{AliasError, CountryAliases};
use crate::data::indicator::{Indicator, IntegratedTable, NormalizedSeries, RawObservation};
use crate::data::integrate::integrate;
use crate::data::normalize::{NormalizeReport, Normalizer};
use crate::sources::{CsvSource, FetchError, Fetcher, JsonApiSource, SourceReader, XmlApiSource};
use crate::store::{
    open_document_store, write_snapshot_csv, IndicatorDocument, SqliteSnapshotStore, StoreError,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Aliases(#[from] AliasError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] FetchError),
    #[error("source {indicator} failed: {source}")]
    SourceFailed {
        indicator: Indicator,
        #[source]
        source: FetchError,
    },
    #[error("every source failed, previous snapshot left untouched: {}", .failures.join("; "))]
    AllSourcesFailed { failures: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub indicator: Indicator,
    pub location: String,
    pub status: SourceStatus,
    pub raw_observations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<NormalizeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    Written,
    Failed,
    /// Collection of a failed source; its previous contents are left in place.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreReport {
    pub store: String,
    pub status: StoreStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreReport {
    fn from_result(store: String, result: Result<usize, StoreError>) -> Self {
        match result {
            Ok(written) => {
                tracing::info!(%store, written, "store written");
                Self {
                    store,
                    status: StoreStatus::Written,
                    written: Some(written),
                    error: None,
                }
            }
            Err(err) => {
                tracing::error!(%store, error = %err, "store write failed");
                Self {
                    store,
                    status: StoreStatus::Failed,
                    written: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn skipped(store: String, indicator: Indicator) -> Self {
        tracing::warn!(%store, %indicator, "collection not replaced, source failed");
        Self {
            store,
            status: StoreStatus::Skipped,
            written: None,
            error: Some(format!("skipped: source {indicator} failed")),
        }
    }

    /// Skipped collections do not count as failures.
    pub fn succeeded(&self) -> bool {
        self.status != StoreStatus::Failed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: String,
    pub sources: Vec<SourceReport>,
    pub integrated_rows: usize,
    pub stores: Vec<StoreReport>,
}

impl RunReport {
    pub fn failed_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|source| source.status == SourceStatus::Failed)
            .count()
    }

    pub fn store_failures(&self) -> usize {
        self.stores.iter().filter(|store| !store.succeeded()).count()
    }

    /// Every store was written. Degraded sources do not count as failure.
    pub fn is_success(&self) -> bool {
        self.store_failures() == 0
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    pub table: IntegratedTable,
    pub series: Vec<NormalizedSeries>,
}

pub fn build_reader(indicator: Indicator, source: &SourceConfig) -> Box<dyn SourceReader> {
    match source.format {
        SourceFormat::Csv => Box::new(CsvSource::new(indicator, source.location.clone())),
        SourceFormat::Json => Box::new(JsonApiSource::new(indicator, source.location.clone())),
        SourceFormat::Xml => Box::new(XmlApiSource::new(indicator, source.location.clone())),
    }
}

pub async fn run_pipeline(config: &AppConfig) -> Result<RunOutcome, PipelineError> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now().to_rfc3339();
    tracing::info!(%run_id, "pipeline started");

    let aliases = CountryAliases::load(config.alias_overrides.as_deref())?;
    let fetcher = Fetcher::new(
        Duration::from_secs(config.request_timeout_secs),
        config.max_pages,
    )
    .map_err(PipelineError::Client)?;

    let readers: Vec<Box<dyn SourceReader>> = config
        .sources
        .entries()
        .into_iter()
        .map(|(indicator, source)| build_reader(indicator, source))
        .collect();
    let mut fetched = fetch_all(&readers, &fetcher).await;

    if config.fail_fast {
        if let Some(index) = fetched.iter().position(|(_, result)| result.is_err()) {
            let (reader, result) = fetched.swap_remove(index);
            if let Err(source) = result {
                return Err(PipelineError::SourceFailed {
                    indicator: reader.indicator(),
                    source,
                });
            }
        }
    }
    let failures: Vec<String> = fetched
        .iter()
        .filter_map(|(reader, result)| {
            result
                .as_ref()
                .err()
                .map(|err| format!("{}: {err}", reader.indicator()))
        })
        .collect();
    if failures.len() == fetched.len() {
        return Err(PipelineError::AllSourcesFailed { failures });
    }

    let normalizer = Normalizer::new(&aliases);
    let mut source_reports = Vec::new();
    let mut series = Vec::new();
    for (reader, result) in fetched {
        let indicator = reader.indicator();
        let location = reader.location().to_string();
        match result {
            Ok(observations) => {
                let raw_observations = observations.len();
                let (normalized, report) = normalizer.normalize(indicator, observations);
                tracing::info!(
                    %indicator,
                    raw = raw_observations,
                    records = normalized.records.len(),
                    unmapped = report.unmapped,
                    duplicates = report.duplicates_replaced,
                    "source normalized"
                );
                source_reports.push(SourceReport {
                    indicator,
                    location,
                    status: SourceStatus::Ok,
                    raw_observations,
                    normalize: Some(report),
                    error: None,
                });
                series.push(normalized);
            }
            Err(err) => source_reports.push(SourceReport {
                indicator,
                location,
                status: SourceStatus::Failed,
                raw_observations: 0,
                normalize: None,
                error: Some(err.to_string()),
            }),
        }
    }

    let table = integrate(&series, &aliases);
    tracing::info!(
        rows = table.len(),
        consumption = table.coverage(Indicator::ElectricityUsePerCapita),
        renewable = table.coverage(Indicator::RenewablePct),
        losses = table.coverage(Indicator::LossPct),
        "series integrated"
    );

    let failed: Vec<Indicator> = source_reports
        .iter()
        .filter(|source| source.status == SourceStatus::Failed)
        .map(|source| source.indicator)
        .collect();
    let stores = persist(config, &table, &series, &failed, &aliases, &run_id).await;

    let report = RunReport {
        run_id,
        started_at,
        sources: source_reports,
        integrated_rows: table.len(),
        stores,
    };
    tracing::info!(
        failed_sources = report.failed_sources(),
        store_failures = report.store_failures(),
        "pipeline completed"
    );

    Ok(RunOutcome {
        report,
        table,
        series,
    })
}

async fn fetch_all<'r>(
    readers: &'r [Box<dyn SourceReader>],
    fetcher: &Fetcher,
) -> Vec<(&'r dyn SourceReader, Result<Vec<RawObservation>, FetchError>)> {
    let reads = readers.iter().map(|reader| async move {
        let reader: &dyn SourceReader = reader.as_ref();
        tracing::info!(indicator = %reader.indicator(), location = reader.location(), "fetching source");
        let result = reader.read(fetcher).await;
        match &result {
            Ok(observations) => {
                tracing::info!(indicator = %reader.indicator(), observations = observations.len(), "source fetched")
            }
            Err(err) => {
                tracing::error!(indicator = %reader.indicator(), error = %err, "source fetch failed")
            }
        }
        (reader, result)
    });
    join_all(reads).await
}

/// Relational snapshot first, then the document collections. No rollback across stores.
async fn persist(
    config: &AppConfig,
    table: &IntegratedTable,
    series: &[NormalizedSeries],
    failed: &[Indicator],
    aliases: &CountryAliases,
    run_id: &str,
) -> Vec<StoreReport> {
    let mut reports = Vec::new();

    let sqlite_label = format!(
        "sqlite:{}#{}",
        config.sqlite.path.display(),
        config.sqlite.table
    );
    let sqlite_result = SqliteSnapshotStore::new(&config.sqlite.path, &config.sqlite.table)
        .and_then(|store| store.replace(table));
    reports.push(StoreReport::from_result(sqlite_label, sqlite_result));

    reports.push(StoreReport::from_result(
        format!("csv:{}", config.snapshot_csv.display()),
        write_snapshot_csv(&config.snapshot_csv, table),
    ));

    match open_document_store(&config.documents).await {
        Ok(store) => {
            for normalized in series {
                let documents = IndicatorDocument::from_series(normalized, aliases, run_id);
                let collection = normalized.indicator.code();
                let result = store.replace_collection(collection, &documents).await;
                reports.push(StoreReport::from_result(
                    format!("{}/{collection}", store.describe()),
                    result,
                ));
            }
            for indicator in failed {
                reports.push(StoreReport::skipped(
                    format!("{}/{}", store.describe(), indicator.code()),
                    *indicator,
                ));
            }
        }
        Err(err) => reports.push(StoreReport::from_result("documents".to_string(), Err(err))),
    }

    reports
}
