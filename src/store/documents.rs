//! Document stores for the per-source normalized records, one collection per
//! indicator code. Writing a collection replaces its previous contents.

use std::path::PathBuf;

use async_trait::async_trait;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::config::DocumentStoreConfig;
use crate::data::aliases::CountryAliases;
use crate::data::indicator::NormalizedSeries;
use crate::store::{staging_path, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDocument {
    pub run_id: String,
    pub indicator: String,
    pub country_code: String,
    pub country_name: Option<String>,
    pub year: i32,
    pub value: Option<f64>,
}

impl IndicatorDocument {
    pub fn from_series(
        series: &NormalizedSeries,
        aliases: &CountryAliases,
        run_id: &str,
    ) -> Vec<Self> {
        series
            .records
            .iter()
            .map(|record| Self {
                run_id: run_id.to_string(),
                indicator: series.indicator.code().to_string(),
                country_code: record.country_code.clone(),
                country_name: aliases.name(&record.country_code).map(str::to_string),
                year: record.year,
                value: record.value,
            })
            .collect()
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short description for logs and run reports.
    fn describe(&self) -> String;

    /// Replace the contents of `collection` with `documents`.
    async fn replace_collection(
        &self,
        collection: &str,
        documents: &[IndicatorDocument],
    ) -> Result<usize, StoreError>;
}

/// MongoDB when a connection string is configured, a local JSON directory otherwise.
pub async fn open_document_store(
    config: &DocumentStoreConfig,
) -> Result<Box<dyn DocumentStore>, StoreError> {
    match config.mongo_uri.as_deref().map(str::trim) {
        Some(uri) if !uri.is_empty() => {
            let store = MongoDocumentStore::connect(uri, &config.mongo_database).await?;
            Ok(Box::new(store))
        }
        _ => Ok(Box::new(JsonDirDocumentStore::new(&config.json_dir))),
    }
}

pub struct MongoDocumentStore {
    client: mongodb::Client,
    database: String,
}

impl MongoDocumentStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = mongodb::Client::with_uri_str(uri).await?;
        Ok(Self {
            client,
            database: database.to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn describe(&self) -> String {
        format!("mongodb:{}", self.database)
    }

    async fn replace_collection(
        &self,
        collection: &str,
        documents: &[IndicatorDocument],
    ) -> Result<usize, StoreError> {
        let collection = self
            .client
            .database(&self.database)
            .collection::<IndicatorDocument>(collection);
        collection.delete_many(doc! {}).await?;
        if documents.is_empty() {
            return Ok(0);
        }
        let result = collection.insert_many(documents).await?;
        Ok(result.inserted_ids.len())
    }
}

/// One pretty-printed JSON array per collection under `dir`.
#[derive(Debug, Clone)]
pub struct JsonDirDocumentStore {
    dir: PathBuf,
}

impl JsonDirDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    pub fn read_collection(&self, collection: &str) -> Result<Vec<IndicatorDocument>, StoreError> {
        let path = self.collection_path(collection);
        let raw = std::fs::read_to_string(&path).map_err(|err| StoreError::io(&path, err))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl DocumentStore for JsonDirDocumentStore {
    fn describe(&self) -> String {
        format!("json-dir:{}", self.dir.display())
    }

    async fn replace_collection(
        &self,
        collection: &str,
        documents: &[IndicatorDocument],
    ) -> Result<usize, StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| StoreError::io(&self.dir, err))?;
        let path = self.collection_path(collection);
        let staging = staging_path(&path);
        let payload = serde_json::to_string_pretty(documents)?;
        tokio::fs::write(&staging, payload)
            .await
            .map_err(|err| StoreError::io(&staging, err))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|err| StoreError::io(&path, err))?;
        Ok(documents.len())
    }
}
