use crate::{
    country::CountryCentroid,
    factor::{CountryGridFactor, NamedEmissionFactor},
    market::{CarbonMarket, CarbonPrice, RegionMembership},
    product::CatalogProduct,
    transport::TransportFactor,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct EmissionFactorFile {
    pub schema_version: String,
    pub emission_factors: Vec<NamedEmissionFactor>,
}

#[derive(Debug, Deserialize)]
pub struct TransportFactorFile {
    pub schema_version: String,
    pub transport_factors: Vec<TransportFactor>,
}

#[derive(Debug, Deserialize)]
pub struct GridFactorFile {
    pub schema_version: String,
    pub grid_factors: Vec<CountryGridFactor>,
}

#[derive(Debug, Deserialize)]
pub struct ProductFile {
    pub schema_version: String,
    pub products: Vec<CatalogProduct>,
}

#[derive(Debug, Deserialize)]
pub struct CentroidFile {
    pub schema_version: String,
    pub centroids: Vec<CountryCentroid>,
}

#[derive(Debug, Deserialize)]
pub struct MarketFile {
    pub schema_version: String,
    #[serde(default)]
    pub markets: Vec<CarbonMarket>,
    #[serde(default)]
    pub prices: Vec<CarbonPrice>,
    #[serde(default)]
    pub regions: Vec<RegionMembership>,
}
