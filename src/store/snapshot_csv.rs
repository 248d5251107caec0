//! CSV export of the integrated snapshot, the file the dashboard tooling reads.

use std::fs;
use std::path::Path;

use crate::data::indicator::{IntegratedRow, IntegratedTable};
use crate::store::{ensure_parent_dir, staging_path, StoreError};

pub const DEFAULT_SNAPSHOT_CSV_PATH: &str = "integrated_electricity_dataset.csv";

const HEADER: [&str; 6] = [
    "country_code",
    "country_name",
    "year",
    "electricity_use_per_capita",
    "renewable_pct",
    "loss_pct",
];

/// Write the snapshot to `path`, replacing any previous file in one rename.
/// On failure the staging file is removed and `path` keeps its old contents.
pub fn write_snapshot_csv(path: &Path, snapshot: &IntegratedTable) -> Result<usize, StoreError> {
    ensure_parent_dir(path)?;
    let staging = staging_path(path);
    let written = write_rows(&staging, snapshot)
        .and_then(|()| fs::rename(&staging, path).map_err(|err| StoreError::io(path, err)));
    if let Err(err) = written {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    Ok(snapshot.len())
}

fn write_rows(staging: &Path, snapshot: &IntegratedTable) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(staging)?;
    if snapshot.is_empty() {
        writer.write_record(HEADER)?;
    }
    for row in &snapshot.rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|err| StoreError::io(staging, err))
}

pub fn read_snapshot_csv(path: &Path) -> Result<IntegratedTable, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<IntegratedRow>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(IntegratedTable { rows })
}
