pub mod builder;
pub mod engine;
pub mod state;
pub mod validation;

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Concurrent blocking computations across all requests.
    pub worker_pool_size: usize,
    pub result_cache_capacity: usize,
    pub result_cache_ttl: Duration,
    pub request_timeout: Duration,
    pub default_load_factor: f64,
    pub max_batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 4,
            result_cache_capacity: 1000,
            result_cache_ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(30),
            default_load_factor: 0.8,
            max_batch_size: 100,
        }
    }
}
