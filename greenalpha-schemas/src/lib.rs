//! Shared data model for the GreenAlpha carbon footprint engine.
//!
//! Everything in this crate is plain serde data: reference tables, country
//! profiles, requests, results and the YAML file wrappers used to override
//! the built-in reference data.

pub mod country;
pub mod factor;
pub mod file_formats;
pub mod market;
pub mod product;
pub mod request;
pub mod result;
pub mod transport;
