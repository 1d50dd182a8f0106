use crate::error::EngineError;
use greenalpha_schemas::{
    request::{Coordinates, FootprintRequest},
    transport::TransportMode,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// A request that passed every semantic check, with codes upper-cased and
/// the transport mode parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub product_name: String,
    pub quantity: f64,
    pub origin_country: String,
    pub destination_country: String,
    pub mode: TransportMode,
    pub origin_coordinates: Option<Coordinates>,
    pub destination_coordinates: Option<Coordinates>,
    pub weight_kg: Option<f64>,
    pub custom_factors: Option<BTreeMap<String, f64>>,
}

#[derive(Serialize)]
struct FingerprintFields<'a> {
    custom_factors: &'a Option<BTreeMap<String, f64>>,
    destination_coordinates: Option<(f64, f64)>,
    destination_country: &'a str,
    origin_coordinates: Option<(f64, f64)>,
    origin_country: &'a str,
    product_name: String,
    quantity: f64,
    transport_mode: &'static str,
    weight_kg: Option<f64>,
}

impl ValidatedRequest {
    /// Hex SHA-256 over the normalized fields. Product names are compared
    /// case-insensitively, as the catalog is.
    pub fn fingerprint(&self) -> Result<String, EngineError> {
        let pair = |c: &Option<Coordinates>| c.map(|c| (c.latitude, c.longitude));
        let fields = FingerprintFields {
            custom_factors: &self.custom_factors,
            destination_coordinates: pair(&self.destination_coordinates),
            destination_country: &self.destination_country,
            origin_coordinates: pair(&self.origin_coordinates),
            origin_country: &self.origin_country,
            product_name: self.product_name.to_lowercase(),
            quantity: self.quantity,
            transport_mode: self.mode.as_str(),
            weight_kg: self.weight_kg,
        };
        let bytes = serde_json::to_vec(&fields)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Material names are matched case-insensitively, so keys are trimmed and
/// lowercased. Two spellings of one material with different values are
/// rejected rather than letting one silently win.
fn material_factors(factors: &BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>, EngineError> {
    let mut normalized = BTreeMap::new();
    for (material, value) in factors {
        let key = material.trim().to_lowercase();
        if key.is_empty() {
            return Err(EngineError::validation(
                "custom_emission_factors",
                "non-empty material names",
            ));
        }
        if !value.is_finite() || *value < 0.0 {
            return Err(EngineError::validation(
                "custom_emission_factors",
                format!("a finite factor >= 0 for '{}'", material),
            ));
        }
        if let Some(previous) = normalized.insert(key.clone(), *value) {
            if previous != *value {
                return Err(EngineError::validation(
                    "custom_emission_factors",
                    format!("one factor per material (conflicting values for '{}')", key),
                ));
            }
        }
    }
    Ok(normalized)
}

pub fn validate(request: &FootprintRequest) -> Result<ValidatedRequest, EngineError> {
    let product_name = request.product_name.trim();
    if product_name.is_empty() || product_name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(EngineError::validation(
            "product_name",
            format!("a non-empty name of at most {} characters", MAX_PRODUCT_NAME_LEN),
        ));
    }

    if !request.quantity.is_finite() || request.quantity <= 0.0 {
        return Err(EngineError::validation("quantity", "a finite number greater than 0"));
    }

    let origin_country = country_code("origin_country", &request.origin_country)?;
    let destination_country = country_code("destination_country", &request.destination_country)?;

    let mode: TransportMode = request.transport_mode.parse().map_err(|_| {
        EngineError::validation(
            "transport_mode",
            format!(
                "one of road, rail, sea, air, pipeline (got '{}')",
                request.transport_mode
            ),
        )
    })?;

    if let Some(c) = request.origin_coordinates {
        coordinates("origin_coordinates", c)?;
    }
    if let Some(c) = request.destination_coordinates {
        coordinates("destination_coordinates", c)?;
    }

    if let Some(weight) = request.weight_kg {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(EngineError::validation("weight_kg", "a finite number greater than 0"));
        }
    }

    let custom_factors = match &request.custom_emission_factors {
        Some(factors) if !factors.is_empty() => Some(material_factors(factors)?),
        _ => None,
    };

    Ok(ValidatedRequest {
        product_name: product_name.to_string(),
        quantity: request.quantity,
        origin_country,
        destination_country,
        mode,
        origin_coordinates: request.origin_coordinates,
        destination_coordinates: request.destination_coordinates,
        weight_kg: request.weight_kg,
        custom_factors,
    })
}

fn country_code(field: &str, raw: &str) -> Result<String, EngineError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(EngineError::validation(
            field,
            format!("a 3-letter ISO country code (got '{}')", raw),
        ))
    }
}

fn coordinates(field: &str, c: Coordinates) -> Result<(), EngineError> {
    let latitude_ok = c.latitude.is_finite() && (-90.0..=90.0).contains(&c.latitude);
    let longitude_ok = c.longitude.is_finite() && (-180.0..=180.0).contains(&c.longitude);
    if latitude_ok && longitude_ok {
        Ok(())
    } else {
        Err(EngineError::validation(
            field,
            "latitude in [-90, 90] and longitude in [-180, 180]",
        ))
    }
}
