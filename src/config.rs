use std::fs;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::app::DEFAULT_GENE_LIST_LIMIT;
use crate::domain::Caller;
use crate::error::GenevizError;
use crate::store::default_store_path;

pub const DEFAULT_CONFIG_FILE: &str = "geneviz.json";
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub store_path: Option<Utf8PathBuf>,
    #[serde(default)]
    pub caller: Option<String>,
    #[serde(default)]
    pub gene_list_limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub store_path: Utf8PathBuf,
    pub caller: Option<Caller>,
    pub gene_list_limit: usize,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `geneviz.json` in the working directory when no path is
    /// given. Only an explicitly named file is required to exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, GenevizError> {
        let config_path = Utf8PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));

        if path.is_none() && !config_path.as_std_path().exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| GenevizError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| GenevizError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, GenevizError> {
        let schema_version = config.schema_version.unwrap_or(CONFIG_SCHEMA_VERSION);
        if schema_version != CONFIG_SCHEMA_VERSION {
            return Err(GenevizError::ConfigParse(format!(
                "unsupported schema_version {schema_version}, expected {CONFIG_SCHEMA_VERSION}"
            )));
        }
        let store_path = match config.store_path {
            Some(path) => path,
            None => default_store_path()?,
        };
        let caller = config
            .caller
            .map(|value| value.parse::<Caller>())
            .transpose()
            .map_err(|err| GenevizError::ConfigParse(err.to_string()))?;
        let gene_list_limit = config.gene_list_limit.unwrap_or(DEFAULT_GENE_LIST_LIMIT);
        if gene_list_limit == 0 {
            return Err(GenevizError::ConfigParse(
                "gene_list_limit must be positive".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            store_path,
            caller,
            gene_list_limit,
        })
    }
}
