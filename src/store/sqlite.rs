//! SQLite snapshot of the integrated table.
//!
//! Every write builds a fresh database next to the target and renames it over
//! the previous file, so a snapshot is always complete and two runs over the
//! same input produce the same bytes.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use crate::data::indicator::{IntegratedRow, IntegratedTable};
use crate::store::{ensure_parent_dir, staging_path, StoreError};

pub const DEFAULT_SQLITE_PATH: &str = "electricity.db";
pub const DEFAULT_TABLE: &str = "integrated_electricity_data";

#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    path: PathBuf,
    table: String,
}

impl SqliteSnapshotStore {
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Result<Self, StoreError> {
        let table = table.into();
        let valid = !table.is_empty()
            && !table.starts_with(|c: char| c.is_ascii_digit())
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(StoreError::InvalidTableName(table));
        }
        Ok(Self {
            path: path.into(),
            table,
        })
    }

    /// Replace the snapshot wholesale. Returns the number of rows written.
    pub fn replace(&self, snapshot: &IntegratedTable) -> Result<usize, StoreError> {
        ensure_parent_dir(&self.path)?;
        let staging = staging_path(&self.path);
        remove_if_exists(&staging)?;

        let written = self.write_fresh(&staging, snapshot);
        if let Err(err) = written {
            let _ = fs::remove_file(&staging);
            return Err(err);
        }
        fs::rename(&staging, &self.path).map_err(|err| StoreError::io(&self.path, err))?;
        Ok(snapshot.len())
    }

    fn write_fresh(&self, path: &Path, snapshot: &IntegratedTable) -> Result<(), StoreError> {
        let mut conn = Connection::open(path)?;
        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "CREATE TABLE \"{table}\" (
                country_code TEXT NOT NULL,
                country_name TEXT,
                year INTEGER NOT NULL,
                electricity_use_per_capita REAL,
                renewable_pct REAL,
                loss_pct REAL,
                PRIMARY KEY (country_code, year)
            );",
            table = self.table
        ))?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO \"{}\" (country_code, country_name, year, electricity_use_per_capita, renewable_pct, loss_pct)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                self.table
            ))?;
            for row in &snapshot.rows {
                insert.execute(params![
                    row.country_code,
                    row.country_name,
                    row.year,
                    row.electricity_use_per_capita,
                    row.renewable_pct,
                    row.loss_pct,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Read the snapshot back in key order.
    pub fn load(&self) -> Result<IntegratedTable, StoreError> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT country_code, country_name, year, electricity_use_per_capita, renewable_pct, loss_pct
             FROM \"{}\" ORDER BY country_code, year",
            self.table
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(IntegratedRow {
                    country_code: row.get(0)?,
                    country_name: row.get(1)?,
                    year: row.get(2)?,
                    electricity_use_per_capita: row.get(3)?,
                    renewable_pct: row.get(4)?,
                    loss_pct: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IntegratedTable { rows })
    }
}

fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StoreError::io(path, err)),
    }
}
