//! Persistence of a run: the integrated snapshot goes to SQLite (and a CSV
//! export); each source's normalized records go to a document store.
//! The two sides are independent: one can succeed while the other fails.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod documents;
pub mod snapshot_csv;
pub mod sqlite;

pub use documents::{open_document_store, DocumentStore, IndicatorDocument, JsonDirDocumentStore};
pub use snapshot_csv::{read_snapshot_csv, write_snapshot_csv};
pub use sqlite::SqliteSnapshotStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("document store: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("failed to serialize documents: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i/o on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid table name '{0}' (use letters, digits and underscores)")]
    InvalidTableName(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Sibling path used to build a replacement before renaming it into place.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))
        }
        _ => Ok(()),
    }
}
