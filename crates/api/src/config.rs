use anyhow::{Context, Result};
use pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub addr: String,
    pub log_format: LogFormat,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            log_format: LogFormat::Text,
            cache: CacheConfig {
                enabled: true,
                max_entries: 10000,
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `PKG_API_ADDR`, `PKG_API_LOG_FORMAT`, `PKG_API_CACHE_ENTRIES`
    /// and `PKG_PIPELINE_CONFIG`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("PKG_API_ADDR") {
            config.addr = addr;
        }
        if let Some(format) = lookup("PKG_API_LOG_FORMAT") {
            config.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            };
        }
        if let Some(entries) = lookup("PKG_API_CACHE_ENTRIES") {
            config.cache.max_entries = entries
                .parse()
                .context(format!("Invalid PKG_API_CACHE_ENTRIES: {}", entries))?;
            config.cache.enabled = config.cache.max_entries > 0;
        }
        if let Some(path) = lookup("PKG_PIPELINE_CONFIG") {
            config.pipeline = PipelineConfig::from_file(Path::new(&path))?;
        }

        Ok(config)
    }
}
