//! Runtime settings from the environment. A `.env` file in the working
//! directory (or the data dir) is loaded first; real env vars win.

use crate::services::metadata::{DEFAULT_FALLBACK_DATE, DEFAULT_UNKNOWN_CLAIM_ID};
use crate::services::search_index::DEFAULT_INDEX_NAME;
use crate::services::{
    ApiKeyAuth, BasicAuth, ClaimFileNameExtractor, HttpSearchIndex, MetadataExtractor, NoAuth,
    NoopSearchIndex, PatternMetadataExtractor, RequestAuth, SearchIndex,
};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORAGE_URL_BASE: &str = "https://{bucket}.s3.amazonaws.com";
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
const APP_DIR: &str = "analysis-exporter";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage_root: PathBuf,
    pub registry_db: PathBuf,
    pub search_endpoint: Option<String>,
    pub search_api_key: Option<String>,
    pub search_username: Option<String>,
    pub search_password: Option<String>,
    pub search_index: String,
    pub search_timeout: Duration,
    pub storage_url_base: String,
    pub unknown_claim_id: String,
    pub fallback_date: String,
    pub metadata_pattern: Option<String>,
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn load_env() {
    let _ = dotenvy::dotenv();
    let data_env = default_data_dir().join(".env");
    if data_env.exists() {
        let _ = dotenvy::from_path(&data_env);
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let data_dir = default_data_dir();

        let search_timeout = match get("EXPORTER_SEARCH_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    name: "EXPORTER_SEARCH_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?,
            None => Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
        };

        Ok(Self {
            storage_root: get("EXPORTER_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("storage")),
            registry_db: get("EXPORTER_REGISTRY_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("registry.db")),
            search_endpoint: get("EXPORTER_SEARCH_ENDPOINT"),
            search_api_key: get("EXPORTER_SEARCH_API_KEY"),
            search_username: get("EXPORTER_SEARCH_USERNAME"),
            search_password: get("EXPORTER_SEARCH_PASSWORD"),
            search_index: get("EXPORTER_SEARCH_INDEX").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            search_timeout,
            storage_url_base: get("EXPORTER_STORAGE_URL_BASE")
                .unwrap_or_else(|| DEFAULT_STORAGE_URL_BASE.to_string()),
            unknown_claim_id: get("EXPORTER_UNKNOWN_CLAIM_ID")
                .unwrap_or_else(|| DEFAULT_UNKNOWN_CLAIM_ID.to_string()),
            fallback_date: get("EXPORTER_FALLBACK_DATE")
                .unwrap_or_else(|| DEFAULT_FALLBACK_DATE.to_string()),
            metadata_pattern: get("EXPORTER_METADATA_PATTERN"),
        })
    }

    /// API key takes precedence over basic credentials.
    pub fn request_auth(&self) -> Box<dyn RequestAuth> {
        if let Some(key) = &self.search_api_key {
            return Box::new(ApiKeyAuth::new(key.clone()));
        }
        if let Some(username) = &self.search_username {
            return Box::new(BasicAuth {
                username: username.clone(),
                password: self.search_password.clone(),
            });
        }
        Box::new(NoAuth)
    }

    /// HTTP index when an endpoint is configured, otherwise a no-op.
    pub fn search_index(&self) -> Result<Box<dyn SearchIndex>, ConfigError> {
        match &self.search_endpoint {
            Some(endpoint) => {
                let index = HttpSearchIndex::new(endpoint, self.request_auth(), self.search_timeout)
                    .map_err(|e| ConfigError::Invalid {
                        name: "EXPORTER_SEARCH_ENDPOINT",
                        reason: e.to_string(),
                    })?;
                Ok(Box::new(index))
            }
            None => {
                tracing::warn!("EXPORTER_SEARCH_ENDPOINT not set, page text will not be indexed");
                Ok(Box::new(NoopSearchIndex))
            }
        }
    }

    pub fn metadata_extractor(&self) -> Result<Box<dyn MetadataExtractor>, ConfigError> {
        match &self.metadata_pattern {
            Some(pattern) => {
                let extractor = PatternMetadataExtractor::new(
                    pattern,
                    self.unknown_claim_id.clone(),
                    self.fallback_date.clone(),
                )
                .map_err(|e| ConfigError::Invalid {
                    name: "EXPORTER_METADATA_PATTERN",
                    reason: e.to_string(),
                })?;
                Ok(Box::new(extractor))
            }
            None => Ok(Box::new(ClaimFileNameExtractor::new(
                self.unknown_claim_id.clone(),
                self.fallback_date.clone(),
            ))),
        }
    }
}
