use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::convert::DEFAULT_CONVERTER;
use crate::domain::RetrieverKind;
use crate::download::RetryPolicy;
use crate::error::OzoneError;
use crate::registry::DEFAULT_SERVER_URL;
use crate::store::DEFAULT_STAGING_ROOT;

pub const AUX_DIR_VAR: &str = "LEDAPS_AUX_DIR";
pub const DEFAULT_CONFIG_FILE: &str = "ozone-aux.json";
pub const DEFAULT_WGET_TRIES: u32 = 5;

/// Optional JSON settings file. Every key may be omitted.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub staging_root: Option<Utf8PathBuf>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_delay_secs: Option<u64>,
    #[serde(default)]
    pub retriever: Option<RetrieverKind>,
    #[serde(default)]
    pub wget_tries: Option<u32>,
    #[serde(default)]
    pub converter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub aux_dir: Utf8PathBuf,
    pub server_url: String,
    pub staging_root: Utf8PathBuf,
    pub retry: RetryPolicy,
    pub retriever: RetrieverKind,
    pub wget_tries: u32,
    pub converter: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `ozone-aux.json` from the working directory when it
    /// exists. No file at all means defaults.
    pub fn load(path: Option<&str>) -> Result<Config, OzoneError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| OzoneError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| OzoneError::ConfigParse(err.to_string()))
    }

    pub fn resolve<F>(path: Option<&str>, env: F) -> Result<ResolvedConfig, OzoneError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve_config(Self::load(path)?, env)
    }

    /// `env` looks up environment variables, normally
    /// `|name| std::env::var(name).ok()`.
    pub fn resolve_config<F>(config: Config, env: F) -> Result<ResolvedConfig, OzoneError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let aux_dir = env(AUX_DIR_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(Utf8PathBuf::from)
            .ok_or(OzoneError::MissingAuxDir)?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: config.max_retries.unwrap_or(defaults.max_retries),
            delay: config
                .retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.delay),
        };

        Ok(ResolvedConfig {
            aux_dir,
            server_url: config
                .server_url
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            staging_root: config
                .staging_root
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STAGING_ROOT)),
            retry,
            retriever: config.retriever.unwrap_or(RetrieverKind::Wget),
            wget_tries: config.wget_tries.unwrap_or(DEFAULT_WGET_TRIES),
            converter: config
                .converter
                .unwrap_or_else(|| DEFAULT_CONVERTER.to_string()),
        })
    }
}
