use crate::market::TradingOpportunity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionBreakdown {
    pub energy_emissions: f64,
    pub material_emissions: f64,
    pub process_emissions: f64,
    pub total: f64,
    /// material name -> kg CO2e for the whole quantity
    pub material_breakdown: BTreeMap<String, f64>,
    pub uncertainty_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportBreakdown {
    pub direct_emissions: f64,
    pub upstream_fuel: f64,
    pub infrastructure: f64,
    pub total: f64,
    pub emission_factor_used: f64,
    pub distance_km: f64,
    pub weight_kg: f64,
    pub uncertainty_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyAnalysis {
    pub production_uncertainty: f64,
    pub transport_uncertainty: f64,
    pub overall_uncertainty: f64,
}

impl UncertaintyAnalysis {
    pub fn combine(production_uncertainty: f64, transport_uncertainty: f64) -> Self {
        Self {
            production_uncertainty,
            transport_uncertainty,
            overall_uncertainty: (production_uncertainty + transport_uncertainty) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub action: String,
    pub potential_reduction: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintResult {
    pub total_emissions_kg_co2e: f64,
    pub production_emissions: f64,
    pub transport_emissions: f64,
    pub scope_1_emissions: f64,
    pub scope_2_emissions: f64,
    pub scope_3_emissions: f64,
    pub carbon_cost_usd: f64,
    pub carbon_trading_opportunities: Vec<TradingOpportunity>,
    pub confidence_percent: f64,
    pub response_time_ms: f64,
    pub calculation_method: String,
    pub data_sources: Vec<String>,
    pub production_breakdown: ProductionBreakdown,
    pub transport_breakdown: TransportBreakdown,
    pub uncertainty_analysis: UncertaintyAnalysis,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub result: FootprintResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemError {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_emissions_kg_co2e: f64,
    pub average_emissions_kg_co2e: f64,
    pub min_emissions_kg_co2e: f64,
    pub max_emissions_kg_co2e: f64,
    pub total_carbon_cost_usd: f64,
    pub average_carbon_cost_usd: f64,
    pub calculation_count: usize,
}

impl BatchSummary {
    /// Returns `None` for an empty slice.
    pub fn from_results<'a, I>(results: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a FootprintResult>,
    {
        let mut count = 0usize;
        let mut total = 0.0;
        let mut cost = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for r in results {
            count += 1;
            total += r.total_emissions_kg_co2e;
            cost += r.carbon_cost_usd;
            min = min.min(r.total_emissions_kg_co2e);
            max = max.max(r.total_emissions_kg_co2e);
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            total_emissions_kg_co2e: total,
            average_emissions_kg_co2e: total / count as f64,
            min_emissions_kg_co2e: min,
            max_emissions_kg_co2e: max,
            total_carbon_cost_usd: cost,
            average_carbon_cost_usd: cost / count as f64,
            calculation_count: count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub total_calculations: usize,
    pub successful_calculations: usize,
    pub failed_calculations: usize,
    pub processing_time_ms: f64,
    pub results: Vec<BatchItem>,
    pub errors: Vec<BatchItemError>,
    pub summary: Option<BatchSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub avg_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub p99_response_time_ms: f64,
    pub total_calculations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub cache_size: usize,
}
