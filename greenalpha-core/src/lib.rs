//! GreenAlpha carbon footprint engine.
//!
//! Turns a (product, origin, destination, quantity, transport mode) request
//! into a production plus transport emissions estimate with scope split,
//! uncertainty and a heuristic confidence score.
//!
//! ```no_run
//! use greenalpha_core::engine::builder::FootprintEngineBuilder;
//! use greenalpha_schemas::request::FootprintRequest;
//!
//! # async fn run() -> Result<(), greenalpha_core::error::EngineError> {
//! let engine = FootprintEngineBuilder::new().build()?;
//! let request = FootprintRequest::new("smartphone", 1000.0, "CHN", "USA", "sea");
//! let result = engine.calculate(&request).await?;
//! println!("{:.2} kg CO2e", result.total_emissions_kg_co2e);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod calculation;
pub mod engine;
pub mod error;
pub mod geo;
pub mod history;
pub mod logger;
pub mod pricing;
pub mod reference;
