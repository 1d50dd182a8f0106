use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionProfile {
    /// kWh per unit
    pub energy_intensity: f64,
    /// material name -> kg per unit
    pub material_footprint: BTreeMap<String, f64>,
    /// litres per unit
    #[serde(default)]
    pub water_usage: f64,
    /// kg waste per unit
    #[serde(default)]
    pub waste_generation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub product_name: String,
    /// Shipping weight of one unit, used when a request carries no weight.
    #[serde(default = "default_unit_weight_kg")]
    pub unit_weight_kg: f64,
    #[serde(flatten)]
    pub profile: ProductionProfile,
}

fn default_unit_weight_kg() -> f64 {
    1.0
}
