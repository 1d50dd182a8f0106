use crate::error::EngineError;
use csv::Writer;
use greenalpha_schemas::{request::FootprintRequest, result::FootprintResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    product_name: &'a str,
    quantity: f64,
    origin_country: &'a str,
    destination_country: &'a str,
    transport_mode: &'a str,
    total_emissions_kg_co2e: f64,
    production_emissions: f64,
    transport_emissions: f64,
    scope_1_emissions: f64,
    scope_2_emissions: f64,
    scope_3_emissions: f64,
    carbon_cost_usd: f64,
    confidence_percent: f64,
    overall_uncertainty: f64,
    response_time_ms: f64,
    material_breakdown_json: String,
}

/// Appends one CSV row per footprint result.
pub struct ResultLogger {
    writer: Writer<fs::File>,
}

impl ResultLogger {
    pub fn new(path: &Path) -> Result<Self, EngineError> {
        let writer =
            Writer::from_path(path).map_err(|e| EngineError::CsvError(path.display().to_string(), e))?;
        Ok(Self { writer })
    }

    pub fn log_result(
        &mut self,
        request: &FootprintRequest,
        result: &FootprintResult,
    ) -> Result<(), anyhow::Error> {
        let material_breakdown_json =
            serde_json::to_string(&result.production_breakdown.material_breakdown)?;

        let row = ResultRow {
            product_name: request.product_name.trim(),
            quantity: request.quantity,
            origin_country: &request.origin_country,
            destination_country: &request.destination_country,
            transport_mode: &request.transport_mode,
            total_emissions_kg_co2e: result.total_emissions_kg_co2e,
            production_emissions: result.production_emissions,
            transport_emissions: result.transport_emissions,
            scope_1_emissions: result.scope_1_emissions,
            scope_2_emissions: result.scope_2_emissions,
            scope_3_emissions: result.scope_3_emissions,
            carbon_cost_usd: result.carbon_cost_usd,
            confidence_percent: result.confidence_percent,
            overall_uncertainty: result.uncertainty_analysis.overall_uncertainty,
            response_time_ms: result.response_time_ms,
            material_breakdown_json,
        };

        self.writer.serialize(row)?;
        self.writer.flush()?;
        Ok(())
    }
}
