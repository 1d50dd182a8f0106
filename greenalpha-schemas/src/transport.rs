use crate::factor::EmissionFactor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[serde(alias = "road_truck")]
    Road,
    Rail,
    #[serde(alias = "sea_freight")]
    Sea,
    #[serde(alias = "air_freight")]
    Air,
    Pipeline,
}

impl TransportMode {
    pub const ALL: [TransportMode; 5] = [
        TransportMode::Road,
        TransportMode::Rail,
        TransportMode::Sea,
        TransportMode::Air,
        TransportMode::Pipeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Road => "road",
            TransportMode::Rail => "rail",
            TransportMode::Sea => "sea",
            TransportMode::Air => "air",
            TransportMode::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTransportModeError(pub String);

impl fmt::Display for ParseTransportModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown transport mode '{}' (expected one of: road, rail, sea, air, pipeline)",
            self.0
        )
    }
}

impl std::error::Error for ParseTransportModeError {}

impl FromStr for TransportMode {
    type Err = ParseTransportModeError;

    /// Accepts the short names and the legacy `*_truck`/`*_freight` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "road" | "road_truck" | "truck" => Ok(TransportMode::Road),
            "rail" => Ok(TransportMode::Rail),
            "sea" | "sea_freight" | "ship" => Ok(TransportMode::Sea),
            "air" | "air_freight" => Ok(TransportMode::Air),
            "pipeline" => Ok(TransportMode::Pipeline),
            _ => Err(ParseTransportModeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSpec {
    pub distance_km: f64,
    pub weight_kg: f64,
    pub mode: TransportMode,
    /// Fraction of vehicle capacity in use, in (0, 1].
    pub load_factor: f64,
}

/// One row of the transport factor table. Mode-specific numbers live here,
/// not on the enum, so methodology updates only touch data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportFactor {
    pub mode: TransportMode,
    /// kg CO2e per tonne-km
    pub factor: EmissionFactor,
    pub adjustment: f64,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing_accepts_aliases() {
        assert_eq!("SEA".parse::<TransportMode>().unwrap(), TransportMode::Sea);
        assert_eq!(" road_truck ".parse::<TransportMode>().unwrap(), TransportMode::Road);
        assert_eq!("air_freight".parse::<TransportMode>().unwrap(), TransportMode::Air);
        assert!("teleport".parse::<TransportMode>().is_err());
    }

    #[test]
    fn test_mode_serde_uses_short_names() {
        assert_eq!(serde_json::to_string(&TransportMode::Pipeline).unwrap(), "\"pipeline\"");
        let mode: TransportMode = serde_json::from_str("\"sea_freight\"").unwrap();
        assert_eq!(mode, TransportMode::Sea);
    }
}
