use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::document::Scalar;
use crate::error::IsaError;
use crate::filter::Filter;

pub const DEFAULT_CONFIG_FILE: &str = "isa-find.json";
pub const DEFAULT_DOCUMENT: &str = "metadata.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub data_root: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<FilterValue> for Scalar {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Bool(b) => Scalar::Bool(b),
            FilterValue::Integer(i) => Scalar::Integer(i),
            FilterValue::Float(f) => Scalar::Float(f),
            FilterValue::Text(s) => Scalar::String(s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub document: Utf8PathBuf,
    pub data_root: Option<Utf8PathBuf>,
    pub filter: Filter,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            document: Utf8PathBuf::from(DEFAULT_DOCUMENT),
            data_root: None,
            filter: Filter::new(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, IsaError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(IsaError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| IsaError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| IsaError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_or_default(path: Option<&str>) -> Result<ResolvedConfig, IsaError> {
        match Self::resolve(path) {
            Err(IsaError::MissingConfig) => Ok(ResolvedConfig::default()),
            other => other,
        }
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, IsaError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let filter = config
            .filters
            .into_iter()
            .map(|(field, value)| {
                if field.trim().is_empty() {
                    return Err(IsaError::InvalidFilter(format!("empty field name = {value:?}")));
                }
                Ok((field, Scalar::from(value)))
            })
            .collect::<Result<Filter, IsaError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            document: config
                .document
                .map(Utf8PathBuf::from)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DOCUMENT)),
            data_root: config.data_root.map(Utf8PathBuf::from),
            filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.document, Utf8PathBuf::from("metadata.json"));
        assert!(resolved.data_root.is_none());
        assert!(resolved.filter.is_empty());
    }
}
