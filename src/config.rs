//! Layered configuration: built-in defaults, then `electricity.toml` in the
//! working directory, then `ELECTRICITY_*` environment variables (nested keys
//! split on `__`, e.g. `ELECTRICITY_DOCUMENTS__MONGO_URI`).

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::data::indicator::Indicator;
use crate::store::snapshot_csv::DEFAULT_SNAPSHOT_CSV_PATH;
use crate::store::sqlite::{DEFAULT_SQLITE_PATH, DEFAULT_TABLE};

pub const DEFAULT_CONFIG_FILE: &str = "electricity.toml";
pub const ENV_PREFIX: &str = "ELECTRICITY_";

const WORLD_BANK_API: &str = "https://api.worldbank.org/v2/country/all/indicator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
    Xml,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub format: SourceFormat,
    /// `http(s)://` URL or local file path.
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub consumption: SourceConfig,
    pub renewable: SourceConfig,
    pub losses: SourceConfig,
}

impl SourcesConfig {
    pub fn entries(&self) -> [(Indicator, &SourceConfig); 3] {
        [
            (Indicator::ElectricityUsePerCapita, &self.consumption),
            (Indicator::RenewablePct, &self.renewable),
            (Indicator::LossPct, &self.losses),
        ]
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            consumption: SourceConfig {
                format: SourceFormat::Json,
                location: format!(
                    "{WORLD_BANK_API}/{}?format=json&per_page=20000",
                    Indicator::ElectricityUsePerCapita.code()
                ),
            },
            renewable: SourceConfig {
                format: SourceFormat::Csv,
                location: "renewable_electricity.csv".to_string(),
            },
            losses: SourceConfig {
                format: SourceFormat::Xml,
                location: format!("{WORLD_BANK_API}/{}?per_page=20000", Indicator::LossPct.code()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub path: PathBuf,
    pub table: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SQLITE_PATH),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStoreConfig {
    /// MongoDB connection string. Unset means the JSON directory store is used.
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    pub json_dir: PathBuf,
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            mongo_uri: None,
            mongo_database: "electricity_db".to_string(),
            json_dir: PathBuf::from("documents"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind: String,
    pub geojson: PathBuf,
    pub static_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            geojson: PathBuf::from("world_countries.geojson"),
            static_dir: PathBuf::from("static"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub max_pages: u32,
    pub request_timeout_secs: u64,
    /// Abort the run on the first failed source instead of leaving its column empty.
    pub fail_fast: bool,
    /// JSON object of extra `{ "alias": "ISO3" }` country aliases.
    pub alias_overrides: Option<PathBuf>,
    pub sqlite: SqliteConfig,
    pub snapshot_csv: PathBuf,
    pub documents: DocumentStoreConfig,
    pub dashboard: DashboardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            max_pages: 50,
            request_timeout_secs: 60,
            fail_fast: false,
            alias_overrides: None,
            sqlite: SqliteConfig::default(),
            snapshot_csv: PathBuf::from(DEFAULT_SNAPSHOT_CSV_PATH),
            documents: DocumentStoreConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from `config_file` (missing file means defaults) and the environment.
    pub fn load(config_file: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(config_file).extract().map_err(Box::new)
    }

    /// Load from `electricity.toml` in the working directory.
    pub fn load_default() -> Result<Self, Box<figment::Error>> {
        Self::load(Path::new(DEFAULT_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_world_bank_endpoints() {
        let config = AppConfig::default();
        assert!(config
            .sources
            .consumption
            .location
            .contains("EG.USE.ELEC.KH.PC?format=json"));
        assert!(config.sources.losses.location.contains("EG.ELC.LOSS.ZS"));
        assert_eq!(config.sources.renewable.format, SourceFormat::Csv);
        assert!(config.documents.mongo_uri.is_none());
    }

    #[test]
    fn entries_pair_each_indicator_with_its_source() {
        let config = SourcesConfig::default();
        let indicators: Vec<Indicator> = config.entries().iter().map(|(i, _)| *i).collect();
        assert_eq!(indicators, Indicator::ALL.to_vec());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("electricity.toml");
        std::fs::write(
            &path,
            "fail_fast = true\n\n[sqlite]\ntable = \"snapshot\"\n\n[sources.renewable]\nformat = \"json\"\nlocation = \"renewable.json\"\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();

        assert!(config.fail_fast);
        assert_eq!(config.sqlite.table, "snapshot");
        assert_eq!(config.sqlite.path, PathBuf::from(DEFAULT_SQLITE_PATH));
        assert_eq!(config.sources.renewable.format, SourceFormat::Json);
        assert_eq!(config.max_pages, 50);
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.sources, SourcesConfig::default());
    }
}
