#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use electricity_etl::config::{AppConfig, SourceConfig, SourceFormat};

pub const CONSUMPTION_JSON: &str = r#"[
  {"page": 1, "pages": 1, "per_page": 20000, "total": 5, "sourceid": "2", "lastupdated": "2024-06-28"},
  [
    {"indicator": {"id": "EG.USE.ELEC.KH.PC", "value": "Electric power consumption (kWh per capita)"},
     "country": {"id": "US", "value": "United States"}, "countryiso3code": "USA",
     "date": "2020", "value": 1500, "unit": "", "obs_status": "", "decimal": 0},
    {"indicator": {"id": "EG.USE.ELEC.KH.PC", "value": "Electric power consumption (kWh per capita)"},
     "country": {"id": "US", "value": "United States"}, "countryiso3code": "USA",
     "date": "2019", "value": 1450.5, "unit": "", "obs_status": "", "decimal": 0},
    {"indicator": {"id": "EG.USE.ELEC.KH.PC", "value": "Electric power consumption (kWh per capita)"},
     "country": {"id": "FR", "value": "France"}, "countryiso3code": "FRA",
     "date": "2020", "value": null, "unit": "", "obs_status": "", "decimal": 0},
    {"indicator": {"id": "EG.USE.ELEC.KH.PC", "value": "Electric power consumption (kWh per capita)"},
     "country": {"id": "1W", "value": "World"}, "countryiso3code": "WLD",
     "date": "2020", "value": 3000, "unit": "", "obs_status": "", "decimal": 0},
    {"indicator": {"id": "EG.USE.ELEC.KH.PC", "value": "Electric power consumption (kWh per capita)"},
     "country": {"id": "DE", "value": "Germany"}, "countryiso3code": "DEU",
     "date": "2020", "value": 6500, "unit": "", "obs_status": "", "decimal": 0}
  ]
]"#;

pub const RENEWABLE_CSV: &str = "\u{feff}\"Data Source\",\"World Development Indicators\",
\"\",
\"Last Updated Date\",\"2024-06-28\",
\"\",
\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2019\",\"2020\",
\"United States\",\"USA\",\"Renewable electricity output (% of total electricity output)\",\"EG.ELC.RNEW.ZS\",\"38.1\",\"40.2\",
\"France\",\"FRA\",\"Renewable electricity output (% of total electricity output)\",\"EG.ELC.RNEW.ZS\",\"20\",\"..\",
\"World\",\"WLD\",\"Renewable electricity output (% of total electricity output)\",\"EG.ELC.RNEW.ZS\",\"26.0\",\"28.0\",
";

pub const LOSSES_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wb:data page="1" pages="1" per_page="20000" total="4" lastupdated="2024-06-28" xmlns:wb="http://www.worldbank.org">
  <wb:data>
    <wb:indicator id="EG.ELC.LOSS.ZS">Electric power transmission and distribution losses (% of output)</wb:indicator>
    <wb:country id="FR">France</wb:country>
    <wb:countryiso3code>FRA</wb:countryiso3code>
    <wb:date>2019</wb:date>
    <wb:value>6.5</wb:value>
    <wb:unit />
    <wb:obs_status />
    <wb:decimal>1</wb:decimal>
  </wb:data>
  <wb:data>
    <wb:indicator id="EG.ELC.LOSS.ZS">Electric power transmission and distribution losses (% of output)</wb:indicator>
    <wb:country id="FR">France</wb:country>
    <wb:countryiso3code>FRA</wb:countryiso3code>
    <wb:date>2019</wb:date>
    <wb:value>7.1</wb:value>
    <wb:unit />
    <wb:obs_status />
    <wb:decimal>1</wb:decimal>
  </wb:data>
  <wb:data>
    <wb:indicator id="EG.ELC.LOSS.ZS">Electric power transmission and distribution losses (% of output)</wb:indicator>
    <wb:country id="DE">Germany</wb:country>
    <wb:countryiso3code>DEU</wb:countryiso3code>
    <wb:date>2020</wb:date>
    <wb:value>4.1</wb:value>
    <wb:unit />
    <wb:obs_status />
    <wb:decimal>1</wb:decimal>
  </wb:data>
  <wb:data>
    <wb:indicator id="EG.ELC.LOSS.ZS">Electric power transmission and distribution losses (% of output)</wb:indicator>
    <wb:country id="US">United States</wb:country>
    <wb:countryiso3code>USA</wb:countryiso3code>
    <wb:date>2019</wb:date>
    <wb:value />
    <wb:unit />
    <wb:obs_status />
    <wb:decimal>1</wb:decimal>
  </wb:data>
</wb:data>
"#;

pub const BOUNDARIES_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "id": "USA", "properties": {"name": "United States"},
     "geometry": {"type": "Polygon", "coordinates": [[[-125, 25], [-66, 25], [-66, 49], [-125, 49], [-125, 25]]]}},
    {"type": "Feature", "properties": {"name": "France", "ISO_A3": "FRA"},
     "geometry": {"type": "Polygon", "coordinates": [[[-5, 42], [8, 42], [8, 51], [-5, 51], [-5, 42]]]}},
    {"type": "Feature", "properties": {"name": "Iceland", "ISO_A3": "ISL"},
     "geometry": {"type": "Polygon", "coordinates": [[[-24, 63], [-13, 63], [-13, 67], [-24, 67], [-24, 63]]]}}
  ]
}"#;

pub struct Fixtures {
    pub consumption: PathBuf,
    pub renewable: PathBuf,
    pub losses: PathBuf,
}

pub fn write_fixtures(dir: &Path) -> Fixtures {
    let fixtures = Fixtures {
        consumption: dir.join("consumption.json"),
        renewable: dir.join("renewable.csv"),
        losses: dir.join("losses.xml"),
    };
    fs::write(&fixtures.consumption, CONSUMPTION_JSON).expect("consumption fixture should be written");
    fs::write(&fixtures.renewable, RENEWABLE_CSV).expect("renewable fixture should be written");
    fs::write(&fixtures.losses, LOSSES_XML).expect("losses fixture should be written");
    fixtures
}

/// Configuration reading the local fixtures and writing every store under `dir/out`.
pub fn local_config(dir: &Path) -> AppConfig {
    let fixtures = write_fixtures(dir);
    let out = dir.join("out");
    let mut config = AppConfig::default();
    config.sources.consumption = SourceConfig {
        format: SourceFormat::Json,
        location: fixtures.consumption.display().to_string(),
    };
    config.sources.renewable = SourceConfig {
        format: SourceFormat::Csv,
        location: fixtures.renewable.display().to_string(),
    };
    config.sources.losses = SourceConfig {
        format: SourceFormat::Xml,
        location: fixtures.losses.display().to_string(),
    };
    config.sqlite.path = out.join("electricity.db");
    config.snapshot_csv = out.join("integrated_electricity_dataset.csv");
    config.documents.json_dir = out.join("documents");
    config.dashboard.geojson = dir.join("world_countries.geojson");
    config.dashboard.static_dir = dir.join("static");
    fs::write(&config.dashboard.geojson, BOUNDARIES_GEOJSON).expect("boundary fixture should be written");
    config
}
