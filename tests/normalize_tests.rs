use std::fs;

use electricity_etl::data::{AliasError, CountryAliases, Indicator, Normalizer, RawObservation};

fn obs(country_id: &str, year: &str, value: Option<&str>) -> RawObservation {
    RawObservation {
        country_id: country_id.to_string(),
        country_name: None,
        year: year.to_string(),
        value: value.map(str::to_string),
    }
}

#[test]
fn every_normalized_code_is_canonical() {
    let aliases = CountryAliases::iso_default();
    let normalizer = Normalizer::new(&aliases);
    let observations = vec![
        obs("US", "2020", Some("1500")),
        obs("usa", "2020", Some("1501")),
        obs("United States", "2019", Some("1400")),
        obs("Korea, Rep.", "2020", Some("11000")),
        obs("Cote d’Ivoire", "2020", Some("300")),
        obs("Euro area", "2020", Some("6000")),
        obs("XKX", "2020", Some("1")),
    ];

    let (series, _) = normalizer.normalize(Indicator::ElectricityUsePerCapita, observations);

    assert!(!series.records.is_empty());
    for record in &series.records {
        assert!(
            aliases.is_canonical(&record.country_code),
            "{} is not a canonical code",
            record.country_code
        );
    }
}

#[test]
fn unmapped_identifier_is_dropped_and_counted() {
    let aliases = CountryAliases::iso_default();
    let normalizer = Normalizer::new(&aliases);
    let observations = vec![
        obs("Euro area", "2020", Some("6100")),
        obs("DEU", "2020", Some("6500")),
    ];

    let (series, report) = normalizer.normalize(Indicator::ElectricityUsePerCapita, observations);

    assert_eq!(series.records.len(), 1);
    assert_eq!(series.records[0].country_code, "DEU");
    assert_eq!(report.total, 2);
    assert_eq!(report.unmapped, 1);
    assert_eq!(report.unmapped_ids, vec!["Euro area".to_string()]);
}

#[test]
fn repeated_key_within_one_source_keeps_the_last_value() {
    let aliases = CountryAliases::iso_default();
    let normalizer = Normalizer::new(&aliases);
    let observations = vec![
        obs("FRA", "2019", Some("6.5")),
        obs("FR", "2019", Some("7.1")),
    ];

    let (series, report) = normalizer.normalize(Indicator::LossPct, observations);

    assert_eq!(series.records.len(), 1);
    assert_eq!(series.records[0].key(), ("FRA", 2019));
    assert_eq!(series.records[0].value, Some(7.1));
    assert_eq!(report.duplicates_replaced, 1);
}

#[test]
fn missing_value_markers_stay_absent_never_zero() {
    let aliases = CountryAliases::iso_default();
    let normalizer = Normalizer::new(&aliases);
    let observations = vec![
        obs("USA", "2015", None),
        obs("USA", "2016", Some("")),
        obs("USA", "2017", Some("..")),
        obs("USA", "2018", Some("NA")),
        obs("USA", "2019", Some("0")),
    ];

    let (series, report) = normalizer.normalize(Indicator::RenewablePct, observations);

    let values: Vec<Option<f64>> = series.records.iter().map(|record| record.value).collect();
    assert_eq!(values, vec![None, None, None, None, Some(0.0)]);
    assert_eq!(report.absent_values, 4);
}

#[test]
fn rows_with_unparseable_years_are_skipped() {
    let aliases = CountryAliases::iso_default();
    let normalizer = Normalizer::new(&aliases);
    let observations = vec![obs("USA", "YR2020", Some("1")), obs("USA", "2020", Some("2"))];

    let (series, report) = normalizer.normalize(Indicator::RenewablePct, observations);

    assert_eq!(series.records.len(), 1);
    assert_eq!(report.invalid_year, 1);
    assert_eq!(report.mapped, 1);
}

#[test]
fn output_is_sorted_by_country_then_year() {
    let aliases = CountryAliases::iso_default();
    let normalizer = Normalizer::new(&aliases);
    let observations = vec![
        obs("USA", "2020", Some("1")),
        obs("DEU", "2021", Some("2")),
        obs("DEU", "2019", Some("3")),
    ];

    let (series, _) = normalizer.normalize(Indicator::RenewablePct, observations);

    let keys: Vec<(&str, i32)> = series.records.iter().map(|record| record.key()).collect();
    assert_eq!(keys, vec![("DEU", 2019), ("DEU", 2021), ("USA", 2020)]);
}

#[test]
fn alias_overrides_extend_the_default_table() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("aliases.json");
    fs::write(&path, r#"{ "Kosovo": "SRB", "Turkiye": "TUR" }"#).expect("overrides should be written");

    let aliases = CountryAliases::load(Some(&path)).expect("overrides should load");

    assert_eq!(aliases.resolve("kosovo"), Some("SRB"));
    assert_eq!(aliases.resolve("TURKIYE"), Some("TUR"));
    assert_eq!(aliases.resolve("FR"), Some("FRA"));
}

#[test]
fn alias_override_with_unknown_target_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("aliases.json");
    fs::write(&path, r#"{ "Atlantis": "ATL" }"#).expect("overrides should be written");

    let err = CountryAliases::load(Some(&path)).expect_err("unknown target should fail");
    assert!(matches!(err, AliasError::UnknownTarget { .. }));
}
