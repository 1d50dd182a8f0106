//! Read-only historical emissions by country and year.
//!
//! The source file is loaded lazily on first use behind a one-shot barrier,
//! so concurrent first callers share a single load. Query results are kept in
//! a [`BoundedCache`] with least-accessed eviction.

pub mod loader;
pub mod profile;

use crate::{
    cache::{BoundedCache, CacheSettings, CacheStats, EvictionPolicy},
    error::EngineError,
};
use greenalpha_schemas::country::{
    CountryProfile, CountrySummary, DataCoverage, EmissionRecord, GlobalStatistics, TopEmitter,
};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

pub const SEARCH_LIMIT: usize = 20;
pub const TOP_EMITTERS: usize = 10;
const GLOBAL_STATS_TTL: Duration = Duration::from_secs(7200);

#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub data_path: PathBuf,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/historical_emissions.csv"),
            cache_capacity: 5000,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
pub struct Dataset {
    pub by_country: BTreeMap<String, Vec<EmissionRecord>>,
    pub profiles: BTreeMap<String, CountryProfile>,
    pub total_records: usize,
    pub skipped_rows: usize,
    pub load_time_ms: f64,
}

impl Dataset {
    fn build(records: loader::LoadedRecords, load_time_ms: f64) -> Self {
        let profiles = records
            .by_country
            .iter()
            .filter_map(|(code, series)| profile::build_profile(code, series).map(|p| (code.clone(), p)))
            .collect();
        Self {
            by_country: records.by_country,
            profiles,
            total_records: records.total_records,
            skipped_rows: records.skipped_rows,
            load_time_ms,
        }
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    Profile(CountryProfile),
    History(Vec<EmissionRecord>),
    Search(Vec<CountrySummary>),
    Global(GlobalStatistics),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryStatus {
    NotLoaded,
    Healthy,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryHealth {
    pub status: RepositoryStatus,
    pub countries_loaded: usize,
    pub records_loaded: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryStats {
    pub cache: CacheStats,
    pub countries_loaded: usize,
    pub records_loaded: usize,
    pub skipped_rows: usize,
    pub load_attempts: u64,
}

pub struct HistoricalEmissionsRepository {
    config: RepositoryConfig,
    dataset: RwLock<Arc<OnceCell<Arc<Dataset>>>>,
    cache: BoundedCache<String, CachedValue>,
    /// Bumped by `refresh`. Answers computed from an older dataset are not
    /// kept in the cache.
    generation: AtomicU64,
    load_attempts: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl HistoricalEmissionsRepository {
    pub fn new(config: RepositoryConfig) -> Self {
        let cache = BoundedCache::new(CacheSettings {
            capacity: config.cache_capacity,
            ttl: config.cache_ttl,
            policy: EvictionPolicy::LeastAccessed { fraction: 0.2 },
        });
        Self {
            config,
            dataset: RwLock::new(Arc::new(OnceCell::new())),
            cache,
            generation: AtomicU64::new(0),
            load_attempts: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Waits for the shared load. A failed load leaves the barrier unset so
    /// the next caller tries again.
    async fn dataset(&self) -> Result<(u64, Arc<Dataset>), EngineError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let cell = self.dataset.read().clone();
        let dataset = cell.get_or_try_init(|| self.load()).await?;
        Ok((generation, Arc::clone(dataset)))
    }

    /// Caches an answer derived from the dataset of `generation`. A refresh
    /// that lands before or during the insert wins.
    fn remember(&self, generation: u64, key: String, value: CachedValue, ttl: Duration) {
        self.cache.set_with_ttl(key.clone(), value, ttl);
        if self.generation.load(Ordering::SeqCst) != generation {
            self.cache.remove(&key);
        }
    }

    async fn load(&self) -> Result<Arc<Dataset>, EngineError> {
        self.load_attempts.fetch_add(1, Ordering::SeqCst);
        let path = self.config.data_path.clone();
        info!(path = %path.display(), "Loading historical emissions data");

        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || loader::load_records(&path))
            .await
            .map_err(|e| EngineError::InternalComputation(format!("dataset load task failed: {}", e)))
            .and_then(|loaded| loaded);

        match outcome {
            Ok(records) => {
                let dataset = Dataset::build(records, started.elapsed().as_secs_f64() * 1000.0);
                info!(
                    countries = dataset.profiles.len(),
                    records = dataset.total_records,
                    skipped = dataset.skipped_rows,
                    elapsed_ms = dataset.load_time_ms,
                    "Historical emissions data loaded"
                );
                *self.last_error.lock() = None;
                Ok(Arc::new(dataset))
            }
            Err(e) => {
                let e = match e {
                    EngineError::DataUnavailable(_) => e,
                    other => EngineError::DataUnavailable(other.to_string()),
                };
                error!(error = %e, "Historical emissions data failed to load");
                *self.last_error.lock() = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Forces the initial load without running a query.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        self.dataset().await.map(|_| ())
    }

    /// Drops the loaded dataset and every cached answer, then loads again.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        info!("Refreshing historical emissions data");
        *self.dataset.write() = Arc::new(OnceCell::new());
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
        self.initialize().await
    }

    pub async fn profile(&self, country_code: &str) -> Result<Option<CountryProfile>, EngineError> {
        let code = country_code.trim().to_ascii_uppercase();
        let key = format!("profile:{}", code);
        if let Some(CachedValue::Profile(profile)) = self.cache.get(&key) {
            debug!(country = %code, "Profile cache hit");
            return Ok(Some(profile));
        }

        let (generation, dataset) = self.dataset().await?;
        let profile = dataset.profiles.get(&code).cloned();
        if let Some(p) = &profile {
            self.remember(generation, key, CachedValue::Profile(p.clone()), self.config.cache_ttl);
        }
        Ok(profile)
    }

    /// Estimated electricity factor from the country profile, if the country
    /// is in the dataset.
    pub async fn electricity_factor(&self, country_code: &str) -> Result<Option<f64>, EngineError> {
        Ok(self.profile(country_code).await?.map(|p| p.electricity_factor))
    }

    /// Year-ascending records, both bounds inclusive.
    pub async fn history(
        &self,
        country_code: &str,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Result<Vec<EmissionRecord>, EngineError> {
        let code = country_code.trim().to_ascii_uppercase();
        let key = format!("history:{}:{:?}:{:?}", code, start_year, end_year);
        if let Some(CachedValue::History(records)) = self.cache.get(&key) {
            return Ok(records);
        }

        let (generation, dataset) = self.dataset().await?;
        let records: Vec<EmissionRecord> = dataset
            .by_country
            .get(&code)
            .map(|series| {
                series
                    .iter()
                    .filter(|r| start_year.map_or(true, |s| r.year >= s))
                    .filter(|r| end_year.map_or(true, |e| r.year <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        self.remember(generation, key, CachedValue::History(records.clone()), self.config.cache_ttl);
        Ok(records)
    }

    /// Case-insensitive substring match on name or code, largest emitters
    /// first, at most twenty.
    pub async fn search(&self, query: &str) -> Result<Vec<CountrySummary>, EngineError> {
        let needle = query.trim().to_lowercase();
        let key = format!("search:{}", needle);
        if let Some(CachedValue::Search(results)) = self.cache.get(&key) {
            return Ok(results);
        }

        let (generation, dataset) = self.dataset().await?;
        let mut results: Vec<CountrySummary> = dataset
            .profiles
            .values()
            .filter(|p| {
                p.display_name.to_lowercase().contains(&needle)
                    || p.code.to_lowercase().contains(&needle)
            })
            .map(|p| CountrySummary {
                code: p.code.clone(),
                name: p.display_name.clone(),
                latest_year: p.latest_year,
                total_emissions_tonnes: p.total_emissions_tonnes,
            })
            .collect();
        results.sort_by(|a, b| b.total_emissions_tonnes.total_cmp(&a.total_emissions_tonnes));
        results.truncate(SEARCH_LIMIT);

        self.remember(generation, key, CachedValue::Search(results.clone()), self.config.cache_ttl);
        Ok(results)
    }

    pub async fn global_statistics(&self) -> Result<GlobalStatistics, EngineError> {
        let key = "global_stats".to_string();
        if let Some(CachedValue::Global(stats)) = self.cache.get(&key) {
            return Ok(stats);
        }

        let (generation, dataset) = self.dataset().await?;
        let all_records = || dataset.by_country.values().flatten();

        let latest_year = all_records().map(|r| r.year).max().unwrap_or_default();
        let first_year = all_records().map(|r| r.year).min().unwrap_or_default();
        let global_emissions_tonnes: f64 = all_records()
            .filter(|r| r.year == latest_year)
            .map(|r| r.emissions_tonnes)
            .sum();

        let mut emitters: Vec<&CountryProfile> = dataset.profiles.values().collect();
        emitters.sort_by(|a, b| b.total_emissions_tonnes.total_cmp(&a.total_emissions_tonnes));
        let top_emitters = emitters
            .into_iter()
            .take(TOP_EMITTERS)
            .map(|p| TopEmitter {
                country: p.display_name.clone(),
                code: p.code.clone(),
                emissions_tonnes: p.total_emissions_tonnes,
            })
            .collect();

        let stats = GlobalStatistics {
            total_countries: dataset.profiles.len(),
            latest_year,
            global_emissions_tonnes,
            top_emitters,
            data_coverage: DataCoverage {
                first_year,
                last_year: latest_year,
                total_records: dataset.total_records,
            },
        };
        self.remember(generation, key, CachedValue::Global(stats.clone()), GLOBAL_STATS_TTL);
        Ok(stats)
    }

    pub fn health(&self) -> RepositoryHealth {
        let cell = self.dataset.read().clone();
        let last_error = self.last_error.lock().clone();
        match cell.get() {
            Some(dataset) => RepositoryHealth {
                status: RepositoryStatus::Healthy,
                countries_loaded: dataset.profiles.len(),
                records_loaded: dataset.total_records,
                last_error,
            },
            None => RepositoryHealth {
                status: if last_error.is_some() {
                    RepositoryStatus::Unavailable
                } else {
                    RepositoryStatus::NotLoaded
                },
                countries_loaded: 0,
                records_loaded: 0,
                last_error,
            },
        }
    }

    pub fn stats(&self) -> RepositoryStats {
        let cell = self.dataset.read().clone();
        let (countries_loaded, records_loaded, skipped_rows) = cell
            .get()
            .map(|d| (d.profiles.len(), d.total_records, d.skipped_rows))
            .unwrap_or_default();
        RepositoryStats {
            cache: self.cache.stats(),
            countries_loaded,
            records_loaded,
            skipped_rows,
            load_attempts: self.load_attempts.load(Ordering::SeqCst),
        }
    }
}
