use super::{
    engine::FootprintEngine,
    state::PerformanceWindow,
    EngineConfig,
};
use crate::{
    cache::{BoundedCache, CacheSettings, EvictionPolicy},
    error::EngineError,
    history::HistoricalEmissionsRepository,
    logger::ResultLogger,
    reference::ReferenceDataStore,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A fluent builder for constructing a `FootprintEngine`.
///
/// Only the configuration is required; the reference store defaults to the
/// built-in tables and the historical repository is optional.
#[derive(Default)]
pub struct FootprintEngineBuilder {
    reference: Option<Arc<ReferenceDataStore>>,
    repository: Option<Arc<HistoricalEmissionsRepository>>,
    config: EngineConfig,
    log_path: Option<PathBuf>,
}

impl FootprintEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_data(mut self, reference: Arc<ReferenceDataStore>) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Attaches historical country profiles, used for electricity factors of
    /// countries outside the measured grid table. Every calculation then
    /// requires the dataset to be loadable.
    pub fn with_repository(mut self, repository: Arc<HistoricalEmissionsRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends every freshly computed result to the given CSV file.
    pub fn with_result_logging_to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// # Errors
    ///
    /// Returns `EngineError::ConfigError` for a zero-sized pool, cache or
    /// batch limit, or a load factor outside (0, 1].
    pub fn build(self) -> Result<FootprintEngine, EngineError> {
        let config = self.config;
        if config.worker_pool_size == 0 {
            return Err(EngineError::ConfigError("worker_pool_size must be at least 1".into()));
        }
        if config.result_cache_capacity == 0 {
            return Err(EngineError::ConfigError("result_cache_capacity must be at least 1".into()));
        }
        if config.max_batch_size == 0 {
            return Err(EngineError::ConfigError("max_batch_size must be at least 1".into()));
        }
        if !(config.default_load_factor > 0.0 && config.default_load_factor <= 1.0) {
            return Err(EngineError::ConfigError(format!(
                "default_load_factor must be in (0, 1], got {}",
                config.default_load_factor
            )));
        }

        let logger = match self.log_path {
            Some(path) => Some(Mutex::new(ResultLogger::new(&path)?)),
            None => None,
        };

        let results = BoundedCache::new(CacheSettings {
            capacity: config.result_cache_capacity,
            ttl: config.result_cache_ttl,
            policy: EvictionPolicy::Oldest { fraction: 0.1 },
        });

        Ok(FootprintEngine {
            reference: self
                .reference
                .unwrap_or_else(|| Arc::new(ReferenceDataStore::builtin())),
            repository: self.repository,
            workers: Arc::new(Semaphore::new(config.worker_pool_size)),
            config,
            results,
            generation: AtomicU64::new(0),
            performance: Mutex::new(PerformanceWindow::default()),
            completed: AtomicU64::new(0),
            computations: AtomicU64::new(0),
            logger,
        })
    }
}
