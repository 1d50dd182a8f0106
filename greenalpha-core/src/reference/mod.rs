//! Static reference data: emission factors, transport factors, grid
//! intensities, the product catalog, country centroids and carbon markets.
//!
//! Lookups are plain map accesses. The store is immutable once built and is
//! shared behind an `Arc`; per-request factor overrides go through
//! [`FactorOverlay`] instead of writing into the store.

pub mod defaults;
pub mod loader;

use crate::error::EngineError;
use greenalpha_schemas::{
    country::CountryCentroid,
    factor::{CountryGridFactor, EmissionFactor, GridFactor, NamedEmissionFactor},
    market::{CarbonMarket, CarbonPrice, RegionMembership},
    product::CatalogProduct,
    request::Coordinates,
    transport::{TransportFactor, TransportMode},
};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ReferenceDataStore {
    emission_factors: BTreeMap<String, EmissionFactor>,
    transport_factors: BTreeMap<TransportMode, TransportFactor>,
    grid_factors: HashMap<String, GridFactor>,
    products: BTreeMap<String, CatalogProduct>,
    fallback_product: CatalogProduct,
    centroids: HashMap<String, Coordinates>,
    markets: Vec<CarbonMarket>,
    carbon_prices: BTreeMap<String, f64>,
    regions: HashMap<String, Vec<String>>,
}

/// Outcome of a catalog lookup; `known` is false when the generic profile
/// was substituted.
#[derive(Debug, Clone, Copy)]
pub struct ProductLookup<'a> {
    pub product: &'a CatalogProduct,
    pub known: bool,
}

impl ReferenceDataStore {
    /// An empty store. Only the generic fallback product is present.
    pub fn empty() -> Self {
        Self {
            emission_factors: BTreeMap::new(),
            transport_factors: BTreeMap::new(),
            grid_factors: HashMap::new(),
            products: BTreeMap::new(),
            fallback_product: defaults::generic_product(),
            centroids: HashMap::new(),
            markets: Vec::new(),
            carbon_prices: BTreeMap::new(),
            regions: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut store = Self::empty();
        for factor in defaults::emission_factors() {
            store.insert_emission_factor(factor);
        }
        for factor in defaults::transport_factors() {
            store.insert_transport_factor(factor);
        }
        for grid in defaults::grid_factors() {
            store.insert_grid_factor(grid);
        }
        for product in defaults::products() {
            store.insert_product(product);
        }
        for centroid in defaults::centroids() {
            store.insert_centroid(centroid);
        }
        for market in defaults::markets() {
            store.insert_market(market);
        }
        for price in defaults::carbon_prices() {
            store.insert_carbon_price(price);
        }
        for region in defaults::regions() {
            store.insert_region(region);
        }
        store
    }

    /// Built-in tables with every YAML file under `dir` applied on top.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, EngineError> {
        let mut store = Self::builtin();
        loader::apply_directory(&mut store, dir.as_ref())?;
        Ok(store)
    }

    pub fn insert_emission_factor(&mut self, named: NamedEmissionFactor) {
        self.emission_factors.insert(named.name, named.factor);
    }

    pub fn insert_transport_factor(&mut self, factor: TransportFactor) {
        self.transport_factors.insert(factor.mode, factor);
    }

    pub fn insert_grid_factor(&mut self, grid: CountryGridFactor) {
        self.grid_factors
            .insert(grid.country_code.to_ascii_uppercase(), grid.grid);
    }

    /// Catalog keys are lowercase. Inserting the generic product replaces
    /// the fallback as well.
    pub fn insert_product(&mut self, product: CatalogProduct) {
        let key = product.product_name.to_lowercase();
        if key == defaults::GENERIC_PRODUCT {
            self.fallback_product = product.clone();
        }
        self.products.insert(key, product);
    }

    pub fn insert_centroid(&mut self, centroid: CountryCentroid) {
        self.centroids.insert(
            centroid.country_code.to_ascii_uppercase(),
            Coordinates::new(centroid.latitude, centroid.longitude),
        );
    }

    /// Markets are keyed by name; a later entry with the same name replaces
    /// the earlier one in place.
    pub fn insert_market(&mut self, market: CarbonMarket) {
        match self.markets.iter_mut().find(|m| m.market == market.market) {
            Some(existing) => *existing = market,
            None => self.markets.push(market),
        }
    }

    pub fn insert_carbon_price(&mut self, price: CarbonPrice) {
        self.carbon_prices
            .insert(price.market_code.to_ascii_uppercase(), price.price_per_tonne);
    }

    pub fn insert_region(&mut self, region: RegionMembership) {
        let members = region
            .members
            .iter()
            .map(|m| m.to_ascii_uppercase())
            .collect();
        self.regions.insert(region.region, members);
    }

    pub fn emission_factor(&self, name: &str) -> Result<&EmissionFactor, EngineError> {
        self.emission_factors
            .get(name)
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    pub fn emission_factors(&self) -> impl Iterator<Item = (&String, &EmissionFactor)> {
        self.emission_factors.iter()
    }

    /// Case-insensitive. Never fails: unknown names get the generic profile.
    pub fn production_profile(&self, product_name: &str) -> ProductLookup<'_> {
        match self.products.get(&product_name.trim().to_lowercase()) {
            Some(product) => ProductLookup {
                product,
                known: true,
            },
            None => ProductLookup {
                product: &self.fallback_product,
                known: false,
            },
        }
    }

    pub fn products(&self) -> impl Iterator<Item = &CatalogProduct> {
        self.products.values()
    }

    pub fn transport_factor(&self, mode: TransportMode) -> Result<&TransportFactor, EngineError> {
        self.transport_factors
            .get(&mode)
            .ok_or_else(|| EngineError::InvalidTransportMode(mode.to_string()))
    }

    pub fn transport_factors(&self) -> impl Iterator<Item = &TransportFactor> {
        self.transport_factors.values()
    }

    pub fn grid_factor(&self, country_code: &str) -> Option<GridFactor> {
        self.grid_factors.get(country_code).copied()
    }

    pub fn centroid(&self, country_code: &str) -> Option<Coordinates> {
        self.centroids.get(country_code).copied()
    }

    pub fn carbon_price(&self, market_code: &str) -> Result<f64, EngineError> {
        self.carbon_prices
            .get(&market_code.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| EngineError::NotFound(format!("carbon price for {}", market_code)))
    }

    pub fn carbon_prices(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.carbon_prices.iter()
    }

    pub fn markets(&self) -> &[CarbonMarket] {
        &self.markets
    }

    /// A market is open to a country when one of its eligibility entries is
    /// "global", the country code itself, or a region containing it.
    pub fn is_eligible(&self, market: &CarbonMarket, country_code: &str) -> bool {
        market.eligibility.iter().any(|entry| {
            entry.eq_ignore_ascii_case("global")
                || entry.eq_ignore_ascii_case(country_code)
                || self
                    .regions
                    .get(entry)
                    .map_or(false, |members| members.iter().any(|m| m == country_code))
        })
    }
}

impl Default for ReferenceDataStore {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Request-scoped view of material factors. Overrides shadow the store's
/// values for one calculation and are never written back.
#[derive(Debug, Clone, Copy)]
pub struct FactorOverlay<'a> {
    store: &'a ReferenceDataStore,
    overrides: Option<&'a BTreeMap<String, f64>>,
}

impl<'a> FactorOverlay<'a> {
    pub fn new(store: &'a ReferenceDataStore, overrides: Option<&'a BTreeMap<String, f64>>) -> Self {
        Self { store, overrides }
    }

    /// Override keys are lowercase, so the material name is folded before
    /// consulting them.
    pub fn material_factor(&self, material: &str) -> Option<f64> {
        self.overrides
            .and_then(|o| o.get(material.trim().to_lowercase().as_str()).copied())
            .or_else(|| self.store.emission_factors.get(material).map(|f| f.value))
    }

    pub fn has_overrides(&self) -> bool {
        self.overrides.map_or(false, |o| !o.is_empty())
    }
}
