use anyhow::{Context, Result};
use greenalpha_core::{engine::EngineConfig, history::RepositoryConfig};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};

pub const DEFAULT_CONFIG_FILE: &str = "greenalpha.yaml";

/// Settings read from `greenalpha.yaml`. Every field has a default, so an
/// absent file or a partial one is fine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    /// Directory of YAML files applied over the built-in reference tables.
    pub reference_data_dir: Option<PathBuf>,
    /// Historical emissions CSV. `null` runs without country profiles.
    pub historical_data_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub engine: EngineSection,
    pub history: HistorySection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub worker_pool_size: usize,
    pub result_cache_capacity: usize,
    pub result_cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub default_load_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            reference_data_dir: None,
            historical_data_path: Some(PathBuf::from("data/historical_emissions.csv")),
            output_dir: PathBuf::from("data/runs"),
            engine: EngineSection::default(),
            history: HistorySection::default(),
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            worker_pool_size: defaults.worker_pool_size,
            result_cache_capacity: defaults.result_cache_capacity,
            result_cache_ttl_secs: defaults.result_cache_ttl.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
            default_load_factor: defaults.default_load_factor,
        }
    }
}

impl Default for HistorySection {
    fn default() -> Self {
        let defaults = RepositoryConfig::default();
        Self {
            cache_capacity: defaults.cache_capacity,
            cache_ttl_secs: defaults.cache_ttl.as_secs(),
        }
    }
}

impl AppConfig {
    /// Loads an explicit config file, or `greenalpha.yaml` from the working
    /// directory when present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML from {:?}", path))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            worker_pool_size: self.engine.worker_pool_size,
            result_cache_capacity: self.engine.result_cache_capacity,
            result_cache_ttl: Duration::from_secs(self.engine.result_cache_ttl_secs),
            request_timeout: Duration::from_secs(self.engine.request_timeout_secs),
            default_load_factor: self.engine.default_load_factor,
            ..EngineConfig::default()
        }
    }

    pub fn repository_config(&self) -> Option<RepositoryConfig> {
        self.historical_data_path.as_ref().map(|path| RepositoryConfig {
            data_path: path.clone(),
            cache_capacity: self.history.cache_capacity,
            cache_ttl: Duration::from_secs(self.history.cache_ttl_secs),
        })
    }
}
