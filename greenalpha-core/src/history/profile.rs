//! Derivation of `CountryProfile` entries from per-country emission series.
//!
//! The electricity factor for countries outside the measured table is a
//! bounded heuristic over recent emissions, not measured data.

use greenalpha_schemas::country::{CountryProfile, EmissionRecord, TrendPoint};
use std::collections::BTreeMap;

pub const GLOBAL_AVERAGE_ELECTRICITY: f64 = 0.475;
pub const DEFAULT_POPULATION_MILLIONS: f64 = 50.0;
/// Years before the latest one kept in `historical_trend`.
pub const TREND_WINDOW_YEARS: i32 = 10;

const KNOWN_ELECTRICITY_FACTORS: [(&str, f64); 10] = [
    ("USA", 0.385),
    ("CHN", 0.644),
    ("DEU", 0.338),
    ("JPN", 0.462),
    ("IND", 0.708),
    ("BRA", 0.098),
    ("CAN", 0.110),
    ("GBR", 0.281),
    ("FRA", 0.052),
    ("RUS", 0.322),
];

const POPULATION_MILLIONS: [(&str, f64); 20] = [
    ("CHN", 1440.0),
    ("IND", 1380.0),
    ("USA", 331.0),
    ("IDN", 273.0),
    ("PAK", 220.0),
    ("BRA", 212.0),
    ("NGA", 206.0),
    ("BGD", 164.0),
    ("RUS", 146.0),
    ("MEX", 128.0),
    ("JPN", 126.0),
    ("PHL", 109.0),
    ("ETH", 115.0),
    ("VNM", 97.0),
    ("TUR", 84.0),
    ("DEU", 83.0),
    ("IRN", 83.0),
    ("THA", 70.0),
    ("GBR", 67.0),
    ("FRA", 65.0),
];

/// coal, natural_gas, renewable, nuclear (percent)
const ENERGY_MIXES: [(&str, [f64; 4]); 7] = [
    ("USA", [20.0, 40.0, 20.0, 20.0]),
    ("CHN", [57.0, 8.0, 28.0, 7.0]),
    ("DEU", [24.0, 16.0, 46.0, 14.0]),
    ("JPN", [32.0, 37.0, 20.0, 11.0]),
    ("IND", [61.0, 3.0, 25.0, 11.0]),
    ("BRA", [3.0, 9.0, 83.0, 5.0]),
    ("CAN", [7.0, 11.0, 68.0, 14.0]),
];
const DEFAULT_ENERGY_MIX: [f64; 4] = [35.0, 25.0, 30.0, 10.0];
const ENERGY_SOURCES: [&str; 4] = ["coal", "natural_gas", "renewable", "nuclear"];

fn lookup<T: Copy>(table: &[(&str, T)], code: &str) -> Option<T> {
    table.iter().find(|(c, _)| *c == code).map(|(_, v)| *v)
}

/// `series` must be sorted by year.
pub fn electricity_factor(code: &str, series: &[EmissionRecord]) -> f64 {
    if let Some(known) = lookup(&KNOWN_ELECTRICITY_FACTORS, code) {
        return known;
    }
    if series.len() > 5 {
        let recent = &series[series.len() - 5..];
        let average = recent.iter().map(|r| r.emissions_tonnes).sum::<f64>() / recent.len() as f64;
        return (0.2 + average / 1e9 * 0.1).min(0.8);
    }
    GLOBAL_AVERAGE_ELECTRICITY
}

pub fn per_capita_emissions(code: &str, total_emissions_tonnes: f64) -> f64 {
    let population = lookup(&POPULATION_MILLIONS, code).unwrap_or(DEFAULT_POPULATION_MILLIONS);
    total_emissions_tonnes / (population * 1e6)
}

pub fn energy_mix(code: &str) -> BTreeMap<String, f64> {
    let shares = lookup(&ENERGY_MIXES, code).unwrap_or(DEFAULT_ENERGY_MIX);
    ENERGY_SOURCES
        .iter()
        .zip(shares)
        .map(|(source, share)| (source.to_string(), share))
        .collect()
}

/// Builds a profile from a year-sorted series. `None` for an empty series.
pub fn build_profile(code: &str, series: &[EmissionRecord]) -> Option<CountryProfile> {
    let latest = series.last()?;
    let window_start = latest.year - TREND_WINDOW_YEARS;

    let historical_trend = series
        .iter()
        .filter(|r| r.year >= window_start)
        .map(|r| TrendPoint {
            year: r.year,
            emissions_tonnes: r.emissions_tonnes,
        })
        .collect();

    Some(CountryProfile {
        code: code.to_string(),
        display_name: latest.entity.clone(),
        latest_year: latest.year,
        total_emissions_tonnes: latest.emissions_tonnes,
        per_capita_emissions: per_capita_emissions(code, latest.emissions_tonnes),
        energy_mix: energy_mix(code),
        electricity_factor: electricity_factor(code, series),
        historical_trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(code: &str, years: std::ops::RangeInclusive<i32>, tonnes: f64) -> Vec<EmissionRecord> {
        years
            .map(|year| EmissionRecord {
                entity: format!("Country {code}"),
                country_code: code.to_string(),
                year,
                emissions_tonnes: tonnes,
            })
            .collect()
    }

    #[test]
    fn test_known_factor_wins() {
        assert_eq!(electricity_factor("FRA", &series("FRA", 2000..=2020, 3e8)), 0.052);
    }

    #[test]
    fn test_estimated_factor_is_bounded() {
        let moderate = electricity_factor("POL", &series("POL", 2010..=2020, 3e8));
        assert!((moderate - 0.23).abs() < 1e-12);

        let huge = electricity_factor("XXX", &series("XXX", 2010..=2020, 1e11));
        assert_eq!(huge, 0.8);
    }

    #[test]
    fn test_short_series_uses_global_average() {
        assert_eq!(electricity_factor("POL", &series("POL", 2016..=2020, 3e8)), 0.475);
    }

    #[test]
    fn test_per_capita_and_energy_mix_defaults() {
        assert!((per_capita_emissions("USA", 331e6) - 1.0).abs() < 1e-12);
        assert!((per_capita_emissions("NZL", 50e6) - 1.0).abs() < 1e-12);

        let mix = energy_mix("BRA");
        assert_eq!(mix["renewable"], 83.0);
        assert_eq!(energy_mix("NZL")["coal"], 35.0);
    }

    #[test]
    fn test_profile_trend_window() {
        let profile = build_profile("DEU", &series("DEU", 1990..=2020, 7e8)).unwrap();
        assert_eq!(profile.latest_year, 2020);
        assert_eq!(profile.historical_trend.first().map(|p| p.year), Some(2010));
        assert_eq!(profile.historical_trend.len(), 11);
        assert_eq!(profile.display_name, "Country DEU");
        assert!(build_profile("DEU", &[]).is_none());
    }
}
