use serde::{Deserialize, Serialize};

/// Converts an activity quantity (kWh, kg, tonne-km) into kg CO2e.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    pub value: f64,
    pub unit: String,
    pub source: String,
    pub reference_year: i32,
    pub uncertainty_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl EmissionFactor {
    pub fn new(value: f64, unit: &str, source: &str, reference_year: i32, uncertainty_percent: f64) -> Self {
        Self {
            value,
            unit: unit.to_string(),
            source: source.to_string(),
            reference_year,
            uncertainty_percent,
            region: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEmissionFactor {
    pub name: String,
    #[serde(flatten)]
    pub factor: EmissionFactor,
}

/// Measured grid intensity for a country.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridFactor {
    /// kg CO2e per kWh
    pub electricity: f64,
    #[serde(default = "default_energy_mix_factor")]
    pub energy_mix_factor: f64,
}

fn default_energy_mix_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryGridFactor {
    pub country_code: String,
    #[serde(flatten)]
    pub grid: GridFactor,
}
