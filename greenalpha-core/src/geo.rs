//! Great-circle distances between coordinates and country centroids.

use crate::reference::ReferenceDataStore;
use greenalpha_schemas::request::Coordinates;
use tracing::warn;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCentroid {
    pub coordinates: Coordinates,
    /// False when the code was not in the centroid table and (0, 0) was used.
    pub known: bool,
}

/// Haversine distance in kilometres.
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

pub fn resolve_country_centroid(store: &ReferenceDataStore, country_code: &str) -> ResolvedCentroid {
    match store.centroid(country_code) {
        Some(coordinates) => ResolvedCentroid {
            coordinates,
            known: true,
        },
        None => {
            warn!(country = country_code, "No centroid for country, using (0, 0)");
            ResolvedCentroid {
                coordinates: Coordinates::new(0.0, 0.0),
                known: false,
            }
        }
    }
}

/// Explicit coordinates win over the country centroid, per endpoint.
pub fn endpoint(
    store: &ReferenceDataStore,
    country_code: &str,
    explicit: Option<Coordinates>,
) -> ResolvedCentroid {
    match explicit {
        Some(coordinates) => ResolvedCentroid {
            coordinates,
            known: true,
        },
        None => resolve_country_centroid(store, country_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_same_point() {
        let p = Coordinates::new(51.5, -0.12);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn test_quarter_meridian() {
        let d = distance_km(Coordinates::new(0.0, 0.0), Coordinates::new(90.0, 0.0));
        let expected = EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2;
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_china_to_usa_centroids() {
        let store = ReferenceDataStore::builtin();
        let chn = resolve_country_centroid(&store, "CHN");
        let usa = resolve_country_centroid(&store, "USA");
        let d = distance_km(chn.coordinates, usa.coordinates);
        assert!(chn.known && usa.known);
        assert!(d > 10_000.0 && d < 13_000.0, "distance was {d}");
    }

    #[test]
    fn test_unknown_centroid_is_flagged() {
        let store = ReferenceDataStore::builtin();
        let resolved = resolve_country_centroid(&store, "ZZZ");
        assert!(!resolved.known);
        assert_eq!(resolved.coordinates, Coordinates::new(0.0, 0.0));
    }

    #[test]
    fn test_explicit_coordinates_take_priority() {
        let store = ReferenceDataStore::builtin();
        let explicit = Coordinates::new(31.23, 121.47);
        let resolved = endpoint(&store, "CHN", Some(explicit));
        assert_eq!(resolved.coordinates, explicit);
    }
}
