use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A caller's footprint question: how much CO2e does shipping `quantity`
/// units of a product from one country to another cost.
///
/// Country codes and the transport mode are accepted loosely here and
/// normalized by the engine before anything is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRequest {
    pub product_name: String,
    pub quantity: f64,
    pub origin_country: String,
    pub destination_country: String,
    #[serde(default = "default_transport_mode")]
    pub transport_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_coordinates: Option<Coordinates>,
    /// Total shipment weight. Defaults to catalog unit weight times quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Per-request replacement values for material emission factors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emission_factors: Option<BTreeMap<String, f64>>,
}

fn default_transport_mode() -> String {
    "road".to_string()
}

impl FootprintRequest {
    pub fn new(
        product_name: impl Into<String>,
        quantity: f64,
        origin_country: impl Into<String>,
        destination_country: impl Into<String>,
        transport_mode: impl Into<String>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            origin_country: origin_country.into(),
            destination_country: destination_country.into(),
            transport_mode: transport_mode.into(),
            origin_coordinates: None,
            destination_coordinates: None,
            weight_kg: None,
            custom_emission_factors: None,
        }
    }

    pub fn with_weight_kg(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }

    pub fn with_coordinates(mut self, origin: Coordinates, destination: Coordinates) -> Self {
        self.origin_coordinates = Some(origin);
        self.destination_coordinates = Some(destination);
        self
    }

    pub fn with_custom_factor(mut self, material: impl Into<String>, value: f64) -> Self {
        self.custom_emission_factors
            .get_or_insert_with(BTreeMap::new)
            .insert(material.into(), value);
        self
    }
}
