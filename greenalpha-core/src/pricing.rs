//! Carbon prices, trading-market matching and reduction advice.

use crate::{error::EngineError, reference::ReferenceDataStore};
use greenalpha_schemas::{
    market::TradingOpportunity,
    result::{Priority, Recommendation},
    transport::TransportMode,
};

pub const DEFAULT_PRICING_MARKET: &str = "VOLUNTARY";
/// Tonnes priced by the placeholder cost branch.
pub const PLACEHOLDER_EMISSIONS_TONNES: f64 = 0.1;

pub fn carbon_cost(store: &ReferenceDataStore, emissions_tonnes: f64, market_code: &str) -> Result<f64, EngineError> {
    Ok(emissions_tonnes * store.carbon_price(market_code)?)
}

/// Fixed-volume cost at the voluntary price. It runs alongside the emission
/// branches and so does not see their totals.
pub fn placeholder_carbon_cost(store: &ReferenceDataStore) -> Result<f64, EngineError> {
    carbon_cost(store, PLACEHOLDER_EMISSIONS_TONNES, DEFAULT_PRICING_MARKET)
}

/// Markets open to `country_code`, most valuable first.
pub fn trading_opportunities(
    store: &ReferenceDataStore,
    total_emissions_kg: f64,
    country_code: &str,
) -> Vec<TradingOpportunity> {
    let tonnes = total_emissions_kg / 1000.0;
    let mut opportunities: Vec<TradingOpportunity> = store
        .markets()
        .iter()
        .filter(|market| store.is_eligible(market, country_code))
        .map(|market| TradingOpportunity {
            market: market.clone(),
            potential_value_usd: tonnes * market.price_per_tonne,
            emissions_volume_tonnes: tonnes,
        })
        .collect();

    opportunities.sort_by(|a, b| b.potential_value_usd.total_cmp(&a.potential_value_usd));
    opportunities
}

#[derive(Debug, Clone, Copy)]
pub struct EmissionProfile {
    pub production: f64,
    pub transport: f64,
    pub scope_1: f64,
    pub scope_2: f64,
    pub total: f64,
    pub mode: TransportMode,
}

pub fn recommendations(profile: &EmissionProfile) -> Vec<Recommendation> {
    let mut advice = Vec::new();

    if profile.transport > profile.production * 0.5 {
        match profile.mode {
            TransportMode::Air => advice.push(Recommendation {
                category: "transport".to_string(),
                action: "Consider sea freight instead of air freight".to_string(),
                potential_reduction: "Up to 95% transport emissions".to_string(),
                priority: Priority::High,
            }),
            TransportMode::Road => advice.push(Recommendation {
                category: "transport".to_string(),
                action: "Consider rail transport for long distances".to_string(),
                potential_reduction: "Up to 65% transport emissions".to_string(),
                priority: Priority::Medium,
            }),
            _ => {}
        }
    }

    if profile.scope_2 > profile.scope_1 {
        advice.push(Recommendation {
            category: "production".to_string(),
            action: "Source from countries with cleaner electricity grids".to_string(),
            potential_reduction: "10-50% production emissions".to_string(),
            priority: Priority::Medium,
        });
    }

    if profile.total > 100.0 {
        advice.push(Recommendation {
            category: "offset".to_string(),
            action: "Consider carbon offset programs".to_string(),
            potential_reduction: "Net zero emissions".to_string(),
            priority: Priority::Low,
        });
    }

    advice
}
