use std::fs;

use electricity_etl::config::DocumentStoreConfig;
use electricity_etl::data::{
    CountryAliases, Indicator, IndicatorRecord, IntegratedRow, IntegratedTable, NormalizedSeries,
};
use electricity_etl::store::{
    open_document_store, read_snapshot_csv, write_snapshot_csv, DocumentStore, IndicatorDocument,
    JsonDirDocumentStore, SqliteSnapshotStore, StoreError,
};

fn row(
    country_code: &str,
    country_name: &str,
    year: i32,
    values: (Option<f64>, Option<f64>, Option<f64>),
) -> IntegratedRow {
    IntegratedRow {
        country_code: country_code.to_string(),
        country_name: Some(country_name.to_string()),
        year,
        electricity_use_per_capita: values.0,
        renewable_pct: values.1,
        loss_pct: values.2,
    }
}

fn sample_table() -> IntegratedTable {
    IntegratedTable {
        rows: vec![
            row("DEU", "Germany", 2020, (Some(6500.0), Some(45.0), Some(4.1))),
            row("FRA", "France", 2019, (None, Some(20.0), Some(7.1))),
            row("USA", "United States", 2020, (Some(1500.0), Some(40.2), None)),
        ],
    }
}

#[test]
fn sqlite_snapshot_round_trips_keys_and_values() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = SqliteSnapshotStore::new(dir.path().join("electricity.db"), "integrated_electricity_data")
        .expect("table name should be valid");
    let table = sample_table();

    let written = store.replace(&table).expect("snapshot should be written");
    let loaded = store.load().expect("snapshot should load");

    assert_eq!(written, 3);
    assert_eq!(loaded, table);
    assert_eq!(loaded.keys(), table.keys());
}

#[test]
fn sqlite_replace_discards_previous_rows() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = SqliteSnapshotStore::new(dir.path().join("electricity.db"), "snapshot")
        .expect("table name should be valid");
    store.replace(&sample_table()).expect("first snapshot should be written");

    let smaller = IntegratedTable {
        rows: vec![row("ISL", "Iceland", 2020, (Some(50000.0), Some(100.0), None))],
    };
    store.replace(&smaller).expect("second snapshot should be written");

    assert_eq!(store.load().expect("snapshot should load"), smaller);
    assert!(!dir.path().join("electricity.db.tmp").exists());
}

#[test]
fn sqlite_snapshot_of_the_same_table_is_byte_identical() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("electricity.db");
    let store = SqliteSnapshotStore::new(&path, "integrated_electricity_data").expect("valid table");

    store.replace(&sample_table()).expect("first write");
    let first = fs::read(&path).expect("first snapshot should be readable");
    store.replace(&sample_table()).expect("second write");
    let second = fs::read(&path).expect("second snapshot should be readable");

    assert_eq!(first, second);
}

#[test]
fn invalid_table_names_are_rejected() {
    for name in ["", "1table", "drop table x;", "na\"me"] {
        let err = SqliteSnapshotStore::new("unused.db", name).expect_err("name should be rejected");
        assert!(matches!(err, StoreError::InvalidTableName(_)), "{name}");
    }
}

#[test]
fn csv_snapshot_round_trips_and_keeps_absent_cells_empty() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("nested").join("integrated_electricity_dataset.csv");

    write_snapshot_csv(&path, &sample_table()).expect("csv should be written");
    let raw = fs::read_to_string(&path).expect("csv should be readable");
    let loaded = read_snapshot_csv(&path).expect("csv should load");

    assert!(raw.starts_with(
        "country_code,country_name,year,electricity_use_per_capita,renewable_pct,loss_pct\n"
    ));
    assert!(raw.contains("USA,United States,2020,1500.0,40.2,\n"));
    assert_eq!(loaded, sample_table());
}

#[test]
fn failed_csv_write_removes_its_staging_file() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("snapshot.csv");
    fs::create_dir(&path).expect("blocking directory should be created");
    fs::write(path.join("keep.txt"), "occupied").expect("blocking file should be written");

    let err = write_snapshot_csv(&path, &sample_table()).expect_err("rename over a directory should fail");

    assert!(matches!(err, StoreError::Io { .. }));
    assert!(!dir.path().join("snapshot.csv.tmp").exists());
    assert!(path.join("keep.txt").exists());
}

#[test]
fn empty_csv_snapshot_still_has_a_header() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("empty.csv");

    write_snapshot_csv(&path, &IntegratedTable::default()).expect("csv should be written");

    let raw = fs::read_to_string(&path).expect("csv should be readable");
    assert_eq!(
        raw,
        "country_code,country_name,year,electricity_use_per_capita,renewable_pct,loss_pct\n"
    );
}

#[test]
fn documents_carry_run_id_and_country_name() {
    let aliases = CountryAliases::iso_default();
    let series = NormalizedSeries {
        indicator: Indicator::LossPct,
        records: vec![IndicatorRecord {
            country_code: "FRA".to_string(),
            year: 2019,
            value: Some(7.1),
        }],
    };

    let documents = IndicatorDocument::from_series(&series, &aliases, "run-1");

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].run_id, "run-1");
    assert_eq!(documents[0].indicator, "EG.ELC.LOSS.ZS");
    assert_eq!(documents[0].country_name.as_deref(), Some("France"));
}

#[tokio::test]
async fn json_dir_store_replaces_collection_contents() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let store = JsonDirDocumentStore::new(dir.path().join("documents"));
    let document = |year: i32| IndicatorDocument {
        run_id: "run".to_string(),
        indicator: "EG.ELC.RNEW.ZS".to_string(),
        country_code: "USA".to_string(),
        country_name: Some("United States".to_string()),
        year,
        value: None,
    };

    store
        .replace_collection("EG.ELC.RNEW.ZS", &[document(2019), document(2020)])
        .await
        .expect("first write");
    let written = store
        .replace_collection("EG.ELC.RNEW.ZS", &[document(2021)])
        .await
        .expect("second write");

    let stored = store.read_collection("EG.ELC.RNEW.ZS").expect("collection should load");
    assert_eq!(written, 1);
    assert_eq!(stored, vec![document(2021)]);
}

#[tokio::test]
async fn document_store_defaults_to_json_dir_without_mongo_uri() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let config = DocumentStoreConfig {
        mongo_uri: Some("   ".to_string()),
        mongo_database: "electricity_db".to_string(),
        json_dir: dir.path().join("documents"),
    };

    let store = open_document_store(&config).await.expect("store should open");

    assert!(store.describe().starts_with("json-dir:"));
}
