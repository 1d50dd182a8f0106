use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the historical emissions dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub entity: String,
    pub country_code: String,
    pub year: i32,
    pub emissions_tonnes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub emissions_tonnes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    pub code: String,
    pub display_name: String,
    pub latest_year: i32,
    pub total_emissions_tonnes: f64,
    pub per_capita_emissions: f64,
    /// source name -> percent
    pub energy_mix: BTreeMap<String, f64>,
    /// kg CO2e per kWh; measured for a handful of countries, estimated otherwise
    pub electricity_factor: f64,
    pub historical_trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub code: String,
    pub name: String,
    pub latest_year: i32,
    pub total_emissions_tonnes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopEmitter {
    pub country: String,
    pub code: String,
    pub emissions_tonnes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCoverage {
    pub first_year: i32,
    pub last_year: i32,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub total_countries: usize,
    pub latest_year: i32,
    pub global_emissions_tonnes: f64,
    pub top_emitters: Vec<TopEmitter>,
    pub data_coverage: DataCoverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCentroid {
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
}
