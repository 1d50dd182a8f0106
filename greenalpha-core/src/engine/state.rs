use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

pub const PERFORMANCE_WINDOW: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Idle,
    Validating,
    CacheCheck,
    Computing,
    Merging,
    Cached,
    Returned,
}

/// Tracks one request through the pipeline. Phase changes are logged at
/// debug level.
#[derive(Debug, Clone)]
pub struct RequestTrace {
    pub phase: RequestPhase,
    pub fingerprint: Option<String>,
}

impl RequestTrace {
    pub fn new() -> Self {
        Self {
            phase: RequestPhase::Idle,
            fingerprint: None,
        }
    }

    pub fn advance(&mut self, next: RequestPhase) {
        debug!(
            from = ?self.phase,
            to = ?next,
            fingerprint = self.fingerprint.as_deref().unwrap_or("-"),
            "Request phase"
        );
        self.phase = next;
    }
}

impl Default for RequestTrace {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling window of the most recent response times in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct PerformanceWindow {
    samples: VecDeque<f64>,
}

impl PerformanceWindow {
    pub fn record(&mut self, response_time_ms: f64) {
        if self.samples.len() == PERFORMANCE_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(response_time_ms);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Nearest-rank percentile, `p` in [0, 100].
    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_bounded() {
        let mut window = PerformanceWindow::default();
        for i in 0..(PERFORMANCE_WINDOW + 250) {
            window.record(i as f64);
        }
        assert_eq!(window.len(), PERFORMANCE_WINDOW);
        assert_eq!(window.percentile(0.0), 250.0);
    }

    #[test]
    fn test_percentiles() {
        let mut window = PerformanceWindow::default();
        for i in 1..=100 {
            window.record(i as f64);
        }
        assert_eq!(window.average(), 50.5);
        assert_eq!(window.percentile(95.0), 95.0);
        assert_eq!(window.percentile(99.0), 99.0);
        assert_eq!(window.percentile(100.0), 100.0);
    }

    #[test]
    fn test_trace_advances() {
        let mut trace = RequestTrace::new();
        trace.advance(RequestPhase::Validating);
        trace.advance(RequestPhase::CacheCheck);
        assert_eq!(trace.phase, RequestPhase::CacheCheck);
    }
}
