//! Country alias table. Maps every identifier a source may use for a country
//! (ISO alpha-2, ISO alpha-3, short name, World Bank spelling) onto the
//! canonical ISO alpha-3 code used as the join key.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::data::countries::{ISO_COUNTRIES, WORLD_BANK_NAME_VARIANTS};

#[derive(Debug, Error)]
pub enum AliasError {
    #[error("failed to read alias overrides '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse alias overrides '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("alias '{alias}' targets unknown country code '{target}'")]
    UnknownTarget { alias: String, target: String },
}

#[derive(Debug, Clone, Default)]
pub struct CountryAliases {
    by_alias: HashMap<String, String>,
    names: BTreeMap<String, String>,
}

impl CountryAliases {
    /// ISO 3166-1 countries plus the World Bank name variants.
    pub fn iso_default() -> Self {
        let mut aliases = Self::default();
        for (alpha2, alpha3, name) in ISO_COUNTRIES {
            aliases.names.insert((*alpha3).to_string(), (*name).to_string());
            for alias in [alpha2, alpha3, name] {
                aliases
                    .by_alias
                    .insert(normalize_key(alias), (*alpha3).to_string());
            }
        }
        for (alias, alpha3) in WORLD_BANK_NAME_VARIANTS {
            aliases
                .by_alias
                .insert(normalize_key(alias), (*alpha3).to_string());
        }
        aliases
    }

    /// Default table, extended with a JSON object of `{ "alias": "ISO3" }` when a path is given.
    pub fn load(overrides: Option<&Path>) -> Result<Self, AliasError> {
        let mut aliases = Self::iso_default();
        if let Some(path) = overrides {
            let overrides = load_alias_map(path)?;
            aliases.extend(overrides)?;
        }
        Ok(aliases)
    }

    /// Add aliases. Targets must already be canonical codes of the table.
    pub fn extend(
        &mut self,
        overrides: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), AliasError> {
        for (alias, target) in overrides {
            let target_code = normalize_key(&target);
            if !self.names.contains_key(&target_code) {
                return Err(AliasError::UnknownTarget { alias, target });
            }
            self.by_alias.insert(normalize_key(&alias), target_code);
        }
        Ok(())
    }

    pub fn resolve(&self, raw_id: &str) -> Option<&str> {
        let key = normalize_key(raw_id);
        if key.is_empty() {
            return None;
        }
        self.by_alias.get(&key).map(String::as_str)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn is_canonical(&self, code: &str) -> bool {
        self.names.contains_key(code)
    }

    pub fn canonical_codes(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn load_alias_map(path: &Path) -> Result<HashMap<String, String>, AliasError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| AliasError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| AliasError::Parse {
        path: display,
        source,
    })
}

/// Uppercase, trim and collapse inner whitespace so spelling noise does not matter.
fn normalize_key(value: &str) -> String {
    value
        .trim()
        .replace('’', "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
