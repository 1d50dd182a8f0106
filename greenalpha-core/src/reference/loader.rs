//! YAML overlay loading for the reference store.
//!
//! A reference directory holds one sub-directory per table. Every `.yaml` /
//! `.yml` file found in a sub-directory is parsed into that table's file
//! wrapper and its rows are inserted over the built-in values. Missing
//! sub-directories are skipped.

use super::ReferenceDataStore;
use crate::error::EngineError;
use greenalpha_schemas::file_formats::{
    CentroidFile, EmissionFactorFile, GridFactorFile, MarketFile, ProductFile, TransportFactorFile,
};
use serde::de::DeserializeOwned;
use std::{fs, path::Path, path::PathBuf};
use tracing::{debug, info};

pub const SUPPORTED_SCHEMA_MAJOR: &str = "1";

pub const EMISSION_FACTORS_DIR: &str = "emission_factors";
pub const TRANSPORT_FACTORS_DIR: &str = "transport_factors";
pub const GRID_FACTORS_DIR: &str = "grid_factors";
pub const PRODUCTS_DIR: &str = "products";
pub const CENTROIDS_DIR: &str = "centroids";
pub const MARKETS_DIR: &str = "markets";

trait VersionedFile {
    fn schema_version(&self) -> &str;
}

macro_rules! versioned {
    ($($ty:ty),*) => {
        $(impl VersionedFile for $ty {
            fn schema_version(&self) -> &str {
                &self.schema_version
            }
        })*
    };
}

versioned!(
    EmissionFactorFile,
    TransportFactorFile,
    GridFactorFile,
    ProductFile,
    CentroidFile,
    MarketFile
);

pub fn apply_directory(store: &mut ReferenceDataStore, base: &Path) -> Result<(), EngineError> {
    if !base.is_dir() {
        return Err(EngineError::ConfigError(format!(
            "reference data directory '{}' does not exist",
            base.display()
        )));
    }
    info!(path = %base.display(), "Loading reference data overlay");

    let mut rows = 0usize;
    for file in load_yaml_files::<EmissionFactorFile>(&base.join(EMISSION_FACTORS_DIR))? {
        rows += file.emission_factors.len();
        file.emission_factors
            .into_iter()
            .for_each(|f| store.insert_emission_factor(f));
    }
    for file in load_yaml_files::<TransportFactorFile>(&base.join(TRANSPORT_FACTORS_DIR))? {
        rows += file.transport_factors.len();
        file.transport_factors
            .into_iter()
            .for_each(|f| store.insert_transport_factor(f));
    }
    for file in load_yaml_files::<GridFactorFile>(&base.join(GRID_FACTORS_DIR))? {
        rows += file.grid_factors.len();
        file.grid_factors
            .into_iter()
            .for_each(|g| store.insert_grid_factor(g));
    }
    for file in load_yaml_files::<ProductFile>(&base.join(PRODUCTS_DIR))? {
        rows += file.products.len();
        file.products.into_iter().for_each(|p| store.insert_product(p));
    }
    for file in load_yaml_files::<CentroidFile>(&base.join(CENTROIDS_DIR))? {
        rows += file.centroids.len();
        file.centroids
            .into_iter()
            .for_each(|c| store.insert_centroid(c));
    }
    for file in load_yaml_files::<MarketFile>(&base.join(MARKETS_DIR))? {
        rows += file.markets.len() + file.prices.len() + file.regions.len();
        file.markets.into_iter().for_each(|m| store.insert_market(m));
        file.prices
            .into_iter()
            .for_each(|p| store.insert_carbon_price(p));
        file.regions.into_iter().for_each(|r| store.insert_region(r));
    }

    info!(rows, "Reference data overlay applied");
    Ok(())
}

/// Parses every YAML file in `dir`, in file-name order.
fn load_yaml_files<F>(dir: &Path) -> Result<Vec<F>, EngineError>
where
    F: DeserializeOwned + VersionedFile,
{
    if !dir.is_dir() {
        debug!(path = %dir.display(), "No overlay directory, keeping built-in table");
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|e| EngineError::FileIO(dir.display().to_string(), e))?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| EngineError::FileIO(dir.display().to_string(), e))?
            .path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let path_str = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| EngineError::FileIO(path_str.clone(), e))?;
        let file: F =
            serde_yaml::from_str(&content).map_err(|e| EngineError::YamlParsing(path_str.clone(), e))?;

        let major = file.schema_version().split('.').next().unwrap_or_default();
        if major != SUPPORTED_SCHEMA_MAJOR {
            return Err(EngineError::ConfigError(format!(
                "unsupported schema_version '{}' in '{}'",
                file.schema_version(),
                path_str
            )));
        }
        debug!(path = %path_str, "Parsed reference file");
        files.push(file);
    }
    Ok(files)
}
