//! Pure emission arithmetic. Nothing in here touches a clock, a lock or the
//! filesystem, so identical inputs give bit-identical outputs.

use crate::{
    error::EngineError,
    reference::{defaults::GLOBAL_GRID_FACTOR, FactorOverlay, ReferenceDataStore},
};
use greenalpha_schemas::{
    product::ProductionProfile,
    result::{ProductionBreakdown, TransportBreakdown},
    transport::TransportSpec,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Process emissions as a share of energy emissions.
pub const PROCESS_EMISSION_RATIO: f64 = 0.15;
pub const UPSTREAM_FUEL_RATIO: f64 = 0.2;
pub const INFRASTRUCTURE_RATIO: f64 = 0.05;
pub const GLOBAL_AVERAGE_ELECTRICITY: f64 = 0.475;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensitySource {
    Measured,
    Estimated,
    GlobalAverage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridIntensity {
    pub electricity: f64,
    pub energy_mix_factor: f64,
    pub source: IntensitySource,
}

/// Measured grid table first, then an estimate from the historical country
/// profile, then the global average.
pub fn resolve_grid_intensity(
    store: &ReferenceDataStore,
    country_code: &str,
    estimated_electricity: Option<f64>,
) -> GridIntensity {
    if let Some(grid) = store.grid_factor(country_code) {
        return GridIntensity {
            electricity: grid.electricity,
            energy_mix_factor: grid.energy_mix_factor,
            source: IntensitySource::Measured,
        };
    }
    if let Some(electricity) = estimated_electricity {
        return GridIntensity {
            electricity,
            energy_mix_factor: 1.0,
            source: IntensitySource::Estimated,
        };
    }
    GridIntensity {
        electricity: store
            .emission_factor(GLOBAL_GRID_FACTOR)
            .map(|f| f.value)
            .unwrap_or(GLOBAL_AVERAGE_ELECTRICITY),
        energy_mix_factor: 1.0,
        source: IntensitySource::GlobalAverage,
    }
}

pub fn production_emissions(
    profile: &ProductionProfile,
    grid: GridIntensity,
    quantity: f64,
    factors: &FactorOverlay<'_>,
) -> Result<ProductionBreakdown, EngineError> {
    let energy_emissions =
        profile.energy_intensity * grid.electricity * grid.energy_mix_factor * quantity;

    let mut material_breakdown = BTreeMap::new();
    let mut material_emissions = 0.0;
    for (material, amount) in &profile.material_footprint {
        match factors.material_factor(material) {
            Some(factor) => {
                let emissions = amount * factor * quantity;
                material_emissions += emissions;
                material_breakdown.insert(material.clone(), emissions);
            }
            None => debug!(material = %material, "No emission factor for material, skipping"),
        }
    }

    let process_emissions = energy_emissions * PROCESS_EMISSION_RATIO;
    let total = energy_emissions + material_emissions + process_emissions;

    let breakdown = ProductionBreakdown {
        energy_emissions: ensure_finite("energy_emissions", energy_emissions)?,
        material_emissions: ensure_finite("material_emissions", material_emissions)?,
        process_emissions: ensure_finite("process_emissions", process_emissions)?,
        total: ensure_finite("production_total", total)?,
        material_breakdown,
        uncertainty_percent: production_uncertainty(profile),
    };
    Ok(breakdown)
}

/// Combined-uncertainty proxy over the energy intensity and the summed
/// material footprint: sqrt(sum of squares of the positive terms) / 2 * 100.
pub fn production_uncertainty(profile: &ProductionProfile) -> f64 {
    let material_total: f64 = profile.material_footprint.values().sum();
    let terms = [profile.energy_intensity, material_total];
    let sum_squares: f64 = terms.iter().filter(|v| **v > 0.0).map(|v| v * v).sum();
    sum_squares.sqrt() / terms.len() as f64 * 100.0
}

pub fn transport_emissions(
    store: &ReferenceDataStore,
    spec: &TransportSpec,
) -> Result<TransportBreakdown, EngineError> {
    let factor = store.transport_factor(spec.mode)?;

    let weight_tonnes = spec.weight_kg / 1000.0;
    let base = spec.distance_km * weight_tonnes * factor.factor.value * spec.load_factor;
    let direct = base * factor.adjustment;
    let upstream_fuel = direct * UPSTREAM_FUEL_RATIO;
    let infrastructure = direct * INFRASTRUCTURE_RATIO;

    Ok(TransportBreakdown {
        direct_emissions: ensure_finite("transport_direct", direct)?,
        upstream_fuel: ensure_finite("transport_upstream_fuel", upstream_fuel)?,
        infrastructure: ensure_finite("transport_infrastructure", infrastructure)?,
        total: ensure_finite("transport_total", direct + upstream_fuel + infrastructure)?,
        emission_factor_used: factor.factor.value,
        distance_km: spec.distance_km,
        weight_kg: spec.weight_kg,
        uncertainty_percent: factor.factor.uncertainty_percent,
    })
}

pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::InternalComputation(format!(
            "{} is not a finite number ({})",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenalpha_schemas::transport::TransportMode;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    fn smartphone(store: &ReferenceDataStore) -> ProductionProfile {
        store.production_profile("smartphone").product.profile.clone()
    }

    #[test]
    fn test_smartphone_made_in_china() {
        let store = ReferenceDataStore::builtin();
        let grid = resolve_grid_intensity(&store, "CHN", None);
        let overlay = FactorOverlay::new(&store, None);

        let result = production_emissions(&smartphone(&store), grid, 1.0, &overlay).unwrap();

        assert_eq!(grid.source, IntensitySource::Measured);
        assert!(close(result.energy_emissions, 85.0 * 0.644 * 1.2));
        assert!(close(result.material_emissions, 0.025 * 2.3 + 0.015 * 11.5 + 0.08 * 2.2));
        assert!(close(result.process_emissions, result.energy_emissions * 0.15));
        assert!(close(
            result.total,
            result.energy_emissions + result.material_emissions + result.process_emissions
        ));
        assert_eq!(result.material_breakdown.len(), 3);
    }

    #[test]
    fn test_unknown_materials_are_skipped() {
        let store = ReferenceDataStore::builtin();
        let profile = store.production_profile("t_shirt_cotton").product.profile.clone();
        let grid = resolve_grid_intensity(&store, "USA", None);

        let result =
            production_emissions(&profile, grid, 10.0, &FactorOverlay::new(&store, None)).unwrap();

        assert_eq!(result.material_emissions, 0.0);
        assert!(result.material_breakdown.is_empty());
        assert!(close(result.energy_emissions, 12.0 * 0.385 * 10.0));
    }

    #[test]
    fn test_override_changes_production_by_exact_delta() {
        let store = ReferenceDataStore::builtin();
        let profile = smartphone(&store);
        let grid = resolve_grid_intensity(&store, "DEU", None);
        let overrides: BTreeMap<String, f64> = [("aluminum".to_string(), 8.0)].into_iter().collect();
        let quantity = 250.0;

        let baseline =
            production_emissions(&profile, grid, quantity, &FactorOverlay::new(&store, None)).unwrap();
        let overridden = production_emissions(
            &profile,
            grid,
            quantity,
            &FactorOverlay::new(&store, Some(&overrides)),
        )
        .unwrap();

        let expected = quantity * 0.015 * (8.0 - 11.5);
        assert!(close(overridden.total - baseline.total, expected));
        assert_eq!(store.emission_factor("aluminum").unwrap().value, 11.5);
    }

    #[test]
    fn test_grid_resolution_order() {
        let store = ReferenceDataStore::builtin();
        assert_eq!(resolve_grid_intensity(&store, "IND", Some(0.1)).electricity, 0.708);

        let estimated = resolve_grid_intensity(&store, "GBR", Some(0.281));
        assert_eq!(estimated.source, IntensitySource::Estimated);
        assert_eq!(estimated.energy_mix_factor, 1.0);

        let fallback = resolve_grid_intensity(&store, "NZL", None);
        assert_eq!(fallback.source, IntensitySource::GlobalAverage);
        assert_eq!(fallback.electricity, 0.475);
    }

    #[test]
    fn test_production_uncertainty_proxy() {
        let store = ReferenceDataStore::builtin();
        let expected = (85.0f64.powi(2) + 0.12f64.powi(2)).sqrt() / 2.0 * 100.0;
        assert!(close(production_uncertainty(&smartphone(&store)), expected));
    }

    #[test]
    fn test_non_finite_output_is_internal_error() {
        let store = ReferenceDataStore::builtin();
        let grid = resolve_grid_intensity(&store, "CHN", None);
        let err = production_emissions(&smartphone(&store), grid, f64::MAX, &FactorOverlay::new(&store, None))
            .unwrap_err();
        assert!(matches!(err, EngineError::InternalComputation(_)));
    }

    fn spec(mode: TransportMode) -> TransportSpec {
        TransportSpec {
            distance_km: 5000.0,
            weight_kg: 1000.0,
            mode,
            load_factor: 0.8,
        }
    }

    #[test]
    fn test_transport_components() {
        let store = ReferenceDataStore::builtin();
        let result = transport_emissions(&store, &spec(TransportMode::Road)).unwrap();

        let direct = 5000.0 * 1.0 * 0.062 * 0.8 * 1.0;
        assert!(close(result.direct_emissions, direct));
        assert!(close(result.upstream_fuel, direct * 0.2));
        assert!(close(result.infrastructure, direct * 0.05));
        assert!(close(result.total, direct * 1.25));
        assert_eq!(result.emission_factor_used, 0.062);
        assert_eq!(result.uncertainty_percent, 20.0);
    }

    #[test]
    fn test_transport_mode_ordering() {
        let store = ReferenceDataStore::builtin();
        let total = |mode| transport_emissions(&store, &spec(mode)).unwrap().total;

        let air = total(TransportMode::Air);
        let road = total(TransportMode::Road);
        assert!(air > road);
        assert!(road > total(TransportMode::Rail));
        assert!(road > total(TransportMode::Sea));
    }

    #[test]
    fn test_mode_missing_from_table_fails() {
        let store = ReferenceDataStore::empty();
        assert!(matches!(
            transport_emissions(&store, &spec(TransportMode::Pipeline)),
            Err(EngineError::InvalidTransportMode(_))
        ));
    }
}
