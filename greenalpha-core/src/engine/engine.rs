use super::{
    state::{PerformanceWindow, RequestPhase, RequestTrace},
    validation::{self, ValidatedRequest},
    EngineConfig,
};
use crate::{
    cache::BoundedCache,
    calculation::{self, GridIntensity},
    error::EngineError,
    geo,
    history::{HistoricalEmissionsRepository, RepositoryHealth, RepositoryStatus},
    logger::ResultLogger,
    pricing::{self, EmissionProfile},
    reference::{FactorOverlay, ReferenceDataStore},
};
use futures::future::join_all;
use greenalpha_schemas::{
    request::FootprintRequest,
    result::{
        BatchItem, BatchItemError, BatchOutcome, BatchSummary, FootprintResult,
        PerformanceStats, ProductionBreakdown, TransportBreakdown, UncertaintyAnalysis,
    },
    transport::TransportSpec,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

pub const CALCULATION_METHOD: &str = "IPCC_2021_Guidelines";
pub const DATA_SOURCES: [&str; 4] = ["IPCC", "IEA", "EPA", "ISO14067"];

const KNOWN_PRODUCT_CONFIDENCE: f64 = 95.0;
const UNKNOWN_PRODUCT_CONFIDENCE: f64 = 70.0;
const KNOWN_COUNTRY_CONFIDENCE: f64 = 90.0;
const UNKNOWN_COUNTRY_CONFIDENCE: f64 = 60.0;
const TRANSPORT_CONFIDENCE: f64 = 85.0;
const CUSTOM_FACTOR_CONFIDENCE: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Healthy,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineHealth {
    pub status: EngineStatus,
    pub repository: Option<RepositoryHealth>,
    pub cache_size: usize,
    pub total_calculations: u64,
}

struct ProductionOutcome {
    breakdown: ProductionBreakdown,
    known_product: bool,
}

/// Orchestrates one footprint request: validate, check the result cache,
/// fan the production, transport and pricing branches out onto the worker
/// pool, merge, annotate and cache.
pub struct FootprintEngine {
    pub(super) reference: Arc<ReferenceDataStore>,
    pub(super) repository: Option<Arc<HistoricalEmissionsRepository>>,
    pub(super) config: EngineConfig,
    pub(super) workers: Arc<Semaphore>,
    pub(super) results: BoundedCache<String, FootprintResult>,
    /// Bumped by `refresh` so results computed from older data are not kept.
    pub(super) generation: AtomicU64,
    pub(super) performance: Mutex<PerformanceWindow>,
    pub(super) completed: AtomicU64,
    pub(super) computations: AtomicU64,
    pub(super) logger: Option<Mutex<ResultLogger>>,
}

impl FootprintEngine {
    pub fn reference(&self) -> &ReferenceDataStore {
        &self.reference
    }

    pub fn repository(&self) -> Option<&Arc<HistoricalEmissionsRepository>> {
        self.repository.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of times the three computation branches actually ran. Cache
    /// hits do not count.
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::SeqCst)
    }

    pub async fn calculate(&self, request: &FootprintRequest) -> Result<FootprintResult, EngineError> {
        self.run(request, true).await
    }

    /// Same pipeline without reading or writing the result cache.
    pub async fn calculate_uncached(
        &self,
        request: &FootprintRequest,
    ) -> Result<FootprintResult, EngineError> {
        self.run(request, false).await
    }

    /// Abandons the request once `timeout` elapses. The cache is written
    /// inside the dropped future, so a timed-out request never populates it.
    pub async fn calculate_with_timeout(
        &self,
        request: &FootprintRequest,
        timeout: Duration,
    ) -> Result<FootprintResult, EngineError> {
        match tokio::time::timeout(timeout, self.calculate(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    product = %request.product_name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Footprint request timed out"
                );
                Err(EngineError::Timeout(timeout.as_millis() as u64))
            }
        }
    }

    /// Runs up to `max_batch_size` requests concurrently. Failures are
    /// reported per item and do not fail the batch.
    pub async fn calculate_batch(
        &self,
        requests: &[FootprintRequest],
    ) -> Result<BatchOutcome, EngineError> {
        if requests.is_empty() || requests.len() > self.config.max_batch_size {
            return Err(EngineError::validation(
                "requests",
                format!("between 1 and {} requests", self.config.max_batch_size),
            ));
        }

        let started = Instant::now();
        let timeout = self.config.request_timeout;
        let outcomes = join_all(requests.iter().enumerate().map(|(index, request)| async move {
            (index, self.calculate_with_timeout(request, timeout).await)
        }))
        .await;

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(BatchItem { index, result }),
                Err(e) => errors.push(BatchItemError {
                    index,
                    error: e.to_string(),
                }),
            }
        }

        let summary = BatchSummary::from_results(results.iter().map(|item| &item.result));
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            total = requests.len(),
            successful = results.len(),
            failed = errors.len(),
            elapsed_ms = processing_time_ms,
            "Batch calculation complete"
        );

        Ok(BatchOutcome {
            total_calculations: requests.len(),
            successful_calculations: results.len(),
            failed_calculations: errors.len(),
            processing_time_ms,
            results,
            errors,
            summary,
        })
    }

    async fn run(
        &self,
        request: &FootprintRequest,
        use_cache: bool,
    ) -> Result<FootprintResult, EngineError> {
        let started = Instant::now();
        let generation = self.generation.load(Ordering::SeqCst);
        let mut trace = RequestTrace::new();

        trace.advance(RequestPhase::Validating);
        let validated = validation::validate(request)?;
        self.reference.transport_factor(validated.mode)?;
        if let Some(repository) = &self.repository {
            repository.initialize().await?;
        }

        trace.advance(RequestPhase::CacheCheck);
        let fingerprint = validated.fingerprint()?;
        trace.fingerprint = Some(fingerprint.clone());
        if use_cache {
            if let Some(mut cached) = self.results.get(&fingerprint) {
                debug!(fingerprint = %fingerprint, "Result cache hit");
                cached.response_time_ms = elapsed_ms(started);
                self.record_response_time(cached.response_time_ms);
                trace.advance(RequestPhase::Returned);
                return Ok(cached);
            }
        }

        trace.advance(RequestPhase::Computing);
        let mut result = self.compute(&validated, &mut trace).await.map_err(|e| {
            let e = match e {
                EngineError::Validation { .. }
                | EngineError::InvalidTransportMode(_)
                | EngineError::DataUnavailable(_)
                | EngineError::InternalComputation(_) => e,
                other => EngineError::InternalComputation(other.to_string()),
            };
            error!(
                fingerprint = %fingerprint,
                product = %validated.product_name,
                origin = %validated.origin_country,
                destination = %validated.destination_country,
                mode = %validated.mode,
                error = %e,
                "Footprint calculation failed"
            );
            e
        })?;
        result.response_time_ms = elapsed_ms(started);

        if use_cache {
            self.results.set(fingerprint.clone(), result.clone());
            if self.generation.load(Ordering::SeqCst) != generation {
                self.results.remove(&fingerprint);
            }
            trace.advance(RequestPhase::Cached);
        }
        self.record_response_time(result.response_time_ms);
        self.log_result(request, &result);
        trace.advance(RequestPhase::Returned);

        info!(
            product = %validated.product_name,
            total_kg_co2e = result.total_emissions_kg_co2e,
            elapsed_ms = result.response_time_ms,
            "Footprint calculated"
        );
        Ok(result)
    }

    async fn compute(
        &self,
        request: &ValidatedRequest,
        trace: &mut RequestTrace,
    ) -> Result<FootprintResult, EngineError> {
        self.computations.fetch_add(1, Ordering::SeqCst);

        let estimated_electricity = match &self.repository {
            Some(repository) if self.reference.grid_factor(&request.origin_country).is_none() => {
                repository.electricity_factor(&request.origin_country).await?
            }
            _ => None,
        };
        let grid = calculation::resolve_grid_intensity(
            &self.reference,
            &request.origin_country,
            estimated_electricity,
        );

        let production = self.production_branch(request, grid);
        let transport = self.transport_branch(request);
        let pricing = {
            let store = Arc::clone(&self.reference);
            self.run_branch("pricing", move || pricing::placeholder_carbon_cost(&store))
        };
        let (production, transport, carbon_cost_usd) = tokio::try_join!(production, transport, pricing)?;

        trace.advance(RequestPhase::Merging);
        Ok(self.merge(request, production, transport, carbon_cost_usd))
    }

    async fn production_branch(
        &self,
        request: &ValidatedRequest,
        grid: GridIntensity,
    ) -> Result<ProductionOutcome, EngineError> {
        let store = Arc::clone(&self.reference);
        let product_name = request.product_name.clone();
        let quantity = request.quantity;
        let overrides = request.custom_factors.clone();

        self.run_branch("production", move || {
            let lookup = store.production_profile(&product_name);
            if let Some(overrides) = &overrides {
                let materials = &lookup.product.profile.material_footprint;
                for material in overrides.keys() {
                    if !materials.keys().any(|m| m.trim().eq_ignore_ascii_case(material)) {
                        warn!(
                            product = %product_name,
                            material = %material,
                            "Custom emission factor matches no material of the product"
                        );
                    }
                }
            }
            let overlay = FactorOverlay::new(&store, overrides.as_ref());
            let breakdown =
                calculation::production_emissions(&lookup.product.profile, grid, quantity, &overlay)?;
            Ok(ProductionOutcome {
                breakdown,
                known_product: lookup.known,
            })
        })
        .await
    }

    async fn transport_branch(&self, request: &ValidatedRequest) -> Result<TransportBreakdown, EngineError> {
        let store = Arc::clone(&self.reference);
        let request = request.clone();
        let load_factor = self.config.default_load_factor;

        self.run_branch("transport", move || {
            let origin = geo::endpoint(&store, &request.origin_country, request.origin_coordinates);
            let destination = geo::endpoint(
                &store,
                &request.destination_country,
                request.destination_coordinates,
            );
            let weight_kg = request.weight_kg.unwrap_or_else(|| {
                store.production_profile(&request.product_name).product.unit_weight_kg * request.quantity
            });
            let spec = TransportSpec {
                distance_km: geo::distance_km(origin.coordinates, destination.coordinates),
                weight_kg,
                mode: request.mode,
                load_factor,
            };
            calculation::transport_emissions(&store, &spec)
        })
        .await
    }

    /// Runs `work` on the blocking pool once a worker permit is free. The
    /// permit moves into the task, so it is held until the work finishes
    /// even if the caller stops waiting.
    async fn run_branch<T, F>(&self, branch: &'static str, work: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    {
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| EngineError::InternalComputation("worker pool is closed".to_string()))?;

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(branch, error = %e, "Computation branch aborted");
                Err(EngineError::InternalComputation(format!(
                    "{} branch failed: {}",
                    branch, e
                )))
            }
        }
    }

    fn merge(
        &self,
        request: &ValidatedRequest,
        production: ProductionOutcome,
        transport: TransportBreakdown,
        carbon_cost_usd: f64,
    ) -> FootprintResult {
        let breakdown = production.breakdown;
        let total = breakdown.total + transport.total;

        let scope_1 = breakdown.process_emissions;
        let scope_2 = breakdown.energy_emissions;
        let scope_3 = breakdown.material_emissions + transport.total;

        let mut signals = vec![
            if production.known_product {
                KNOWN_PRODUCT_CONFIDENCE
            } else {
                UNKNOWN_PRODUCT_CONFIDENCE
            },
            if self.reference.grid_factor(&request.origin_country).is_some() {
                KNOWN_COUNTRY_CONFIDENCE
            } else {
                UNKNOWN_COUNTRY_CONFIDENCE
            },
            TRANSPORT_CONFIDENCE,
        ];
        if request.custom_factors.is_some() {
            signals.push(CUSTOM_FACTOR_CONFIDENCE);
        }
        let confidence_percent = signals.iter().sum::<f64>() / signals.len() as f64;

        let uncertainty_analysis =
            UncertaintyAnalysis::combine(breakdown.uncertainty_percent, transport.uncertainty_percent);

        let carbon_trading_opportunities =
            pricing::trading_opportunities(&self.reference, total, &request.destination_country);
        let recommendations = pricing::recommendations(&EmissionProfile {
            production: breakdown.total,
            transport: transport.total,
            scope_1,
            scope_2,
            total,
            mode: request.mode,
        });

        FootprintResult {
            total_emissions_kg_co2e: total,
            production_emissions: breakdown.total,
            transport_emissions: transport.total,
            scope_1_emissions: scope_1,
            scope_2_emissions: scope_2,
            scope_3_emissions: scope_3,
            carbon_cost_usd,
            carbon_trading_opportunities,
            confidence_percent,
            response_time_ms: 0.0,
            calculation_method: CALCULATION_METHOD.to_string(),
            data_sources: DATA_SOURCES.iter().map(|s| s.to_string()).collect(),
            production_breakdown: breakdown,
            transport_breakdown: transport,
            uncertainty_analysis,
            recommendations,
        }
    }

    fn record_response_time(&self, response_time_ms: f64) {
        self.performance.lock().record(response_time_ms);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn log_result(&self, request: &FootprintRequest, result: &FootprintResult) {
        if let Some(logger) = &self.logger {
            if let Err(e) = logger.lock().log_result(request, result) {
                warn!(error = %e, "Failed to append result to CSV log");
            }
        }
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        let window = self.performance.lock();
        let cache = self.results.stats();
        PerformanceStats {
            avg_response_time_ms: window.average(),
            p95_response_time_ms: window.percentile(95.0),
            p99_response_time_ms: window.percentile(99.0),
            total_calculations: self.completed.load(Ordering::Relaxed),
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            cache_hit_rate: cache.hit_rate,
            cache_size: cache.size,
        }
    }

    pub fn health(&self) -> EngineHealth {
        let repository = self.repository.as_ref().map(|r| r.health());
        let status = match &repository {
            Some(h) if h.status == RepositoryStatus::Unavailable => EngineStatus::Unavailable,
            _ => EngineStatus::Healthy,
        };
        EngineHealth {
            status,
            repository,
            cache_size: self.results.len(),
            total_calculations: self.completed.load(Ordering::Relaxed),
        }
    }

    pub fn clear_cache(&self) {
        self.results.clear();
        info!("Result cache cleared");
    }

    /// Reloads the historical dataset and drops every cached result, since
    /// cached footprints may carry electricity estimates from the old data.
    /// The cache is cleared even when the reload fails.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        let reloaded = match &self.repository {
            Some(repository) => repository.refresh().await,
            None => Ok(()),
        };
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.clear_cache();
        reloaded
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::builder::FootprintEngineBuilder;

    fn engine() -> FootprintEngine {
        FootprintEngineBuilder::new().build().unwrap()
    }

    #[tokio::test]
    async fn test_scope_split_adds_up() {
        let engine = engine();
        let result = engine
            .calculate(&FootprintRequest::new("laptop", 20.0, "DEU", "FRA", "rail"))
            .await
            .unwrap();

        let scopes = result.scope_1_emissions + result.scope_2_emissions + result.scope_3_emissions;
        assert!((scopes - result.total_emissions_kg_co2e).abs() < 1e-9);
        assert_eq!(result.calculation_method, CALCULATION_METHOD);
        assert_eq!(result.data_sources.len(), 4);
        assert!(result.confidence_percent >= 0.0 && result.confidence_percent <= 100.0);
    }

    #[tokio::test]
    async fn test_confidence_signals() {
        let engine = engine();

        let known = engine
            .calculate(&FootprintRequest::new("smartphone", 1.0, "CHN", "USA", "sea"))
            .await
            .unwrap();
        assert!((known.confidence_percent - (95.0 + 90.0 + 85.0) / 3.0).abs() < 1e-9);

        let unknown = engine
            .calculate(&FootprintRequest::new("hovercraft", 1.0, "GBR", "USA", "sea"))
            .await
            .unwrap();
        assert!((unknown.confidence_percent - (70.0 + 60.0 + 85.0) / 3.0).abs() < 1e-9);

        let custom = engine
            .calculate(
                &FootprintRequest::new("smartphone", 1.0, "CHN", "USA", "sea").with_custom_factor("steel", 2.0),
            )
            .await
            .unwrap();
        assert!((custom.confidence_percent - (95.0 + 90.0 + 85.0 + 95.0) / 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_opportunities_follow_destination() {
        let engine = engine();
        let result = engine
            .calculate(&FootprintRequest::new("laptop", 100.0, "CHN", "DEU", "sea"))
            .await
            .unwrap();

        let markets: Vec<_> = result
            .carbon_trading_opportunities
            .iter()
            .map(|o| o.market.market.as_str())
            .collect();
        assert_eq!(markets, vec!["EU ETS", "Voluntary Carbon Market"]);
    }

    #[tokio::test]
    async fn test_weight_defaults_to_catalog_estimate() {
        let engine = engine();
        let result = engine
            .calculate(&FootprintRequest::new("laptop", 4.0, "CHN", "USA", "air"))
            .await
            .unwrap();
        assert!((result.transport_breakdown.weight_kg - 10.0).abs() < 1e-12);

        let explicit = engine
            .calculate(&FootprintRequest::new("laptop", 4.0, "CHN", "USA", "air").with_weight_kg(25.0))
            .await
            .unwrap();
        assert_eq!(explicit.transport_breakdown.weight_kg, 25.0);
    }

    #[tokio::test]
    async fn test_missing_transport_factor_fails_before_fan_out() {
        let engine = FootprintEngineBuilder::new()
            .with_reference_data(Arc::new(ReferenceDataStore::empty()))
            .build()
            .unwrap();

        let err = engine
            .calculate(&FootprintRequest::new("smartphone", 1.0, "CHN", "USA", "air"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransportMode(_)));
        assert_eq!(engine.computations(), 0);
    }

    #[tokio::test]
    async fn test_internal_failure_is_not_a_zero_result() {
        let engine = engine();
        let err = engine
            .calculate(&FootprintRequest::new("laptop", f64::MAX, "CHN", "USA", "sea"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InternalComputation(_)));
        assert_eq!(engine.performance_stats().cache_size, 0);
    }

    #[tokio::test]
    async fn test_missing_price_becomes_internal_error() {
        let mut store = ReferenceDataStore::empty();
        for factor in ReferenceDataStore::builtin().transport_factors() {
            store.insert_transport_factor(factor.clone());
        }

        let engine = FootprintEngineBuilder::new()
            .with_reference_data(Arc::new(store))
            .build()
            .unwrap();
        let err = engine
            .calculate(&FootprintRequest::new("smartphone", 1.0, "CHN", "USA", "sea"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InternalComputation(_)));
    }

    #[tokio::test]
    async fn test_result_log_receives_computed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let engine = FootprintEngineBuilder::new()
            .with_result_logging_to_file(&path)
            .build()
            .unwrap();

        let request = FootprintRequest::new("coffee_1kg", 50.0, "BRA", "USA", "sea");
        engine.calculate(&request).await.unwrap();
        engine.calculate(&request).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().starts_with("product_name,quantity"));
    }

    #[tokio::test]
    async fn test_health_and_clear_cache() {
        let engine = engine();
        engine
            .calculate(&FootprintRequest::new("smartphone", 1.0, "CHN", "USA", "sea"))
            .await
            .unwrap();

        let health = engine.health();
        assert_eq!(health.status, EngineStatus::Healthy);
        assert_eq!(health.cache_size, 1);
        assert!(health.repository.is_none());

        engine.clear_cache();
        assert_eq!(engine.health().cache_size, 0);
    }

    fn single_worker_engine() -> FootprintEngine {
        FootprintEngineBuilder::new()
            .with_config(EngineConfig {
                worker_pool_size: 1,
                ..EngineConfig::default()
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_timed_out_request_does_not_populate_cache() {
        let engine = single_worker_engine();
        let request = FootprintRequest::new("smartphone", 1.0, "CHN", "USA", "sea");

        let held = Arc::clone(&engine.workers).acquire_owned().await.unwrap();
        let err = engine
            .calculate_with_timeout(&request, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout(50)));
        drop(held);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.performance_stats().cache_size, 0);

        engine.calculate(&request).await.unwrap();
        assert_eq!(engine.performance_stats().cache_size, 1);
    }

    #[tokio::test]
    async fn test_result_finished_after_refresh_is_not_cached() {
        let engine = Arc::new(single_worker_engine());
        let request = FootprintRequest::new("laptop", 3.0, "DEU", "FRA", "rail");

        let held = Arc::clone(&engine.workers).acquire_owned().await.unwrap();
        let in_flight = {
            let engine = Arc::clone(&engine);
            let request = request.clone();
            tokio::spawn(async move { engine.calculate(&request).await })
        };
        while engine.computations() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        engine.refresh().await.unwrap();
        drop(held);
        in_flight.await.unwrap().unwrap();
        assert_eq!(engine.performance_stats().cache_size, 0);

        engine.calculate(&request).await.unwrap();
        assert_eq!(engine.performance_stats().cache_size, 1);
    }
}
