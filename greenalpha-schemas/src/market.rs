use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liquidity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonMarket {
    pub market: String,
    pub price_per_tonne: f64,
    pub liquidity: Liquidity,
    /// Region names (see `RegionMembership`), ISO3 codes, or "global".
    pub eligibility: Vec<String>,
    pub requirements: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonPrice {
    pub market_code: String,
    /// USD per tonne CO2e
    pub price_per_tonne: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMembership {
    pub region: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingOpportunity {
    #[serde(flatten)]
    pub market: CarbonMarket,
    pub potential_value_usd: f64,
    pub emissions_volume_tonnes: f64,
}
