use anyhow::{Context, Result};
use greenalpha_core::{logger::ResultLogger, reference::ReferenceDataStore};
use greenalpha_schemas::{
    country::{CountryProfile, CountrySummary, EmissionRecord, GlobalStatistics},
    request::FootprintRequest,
    result::{BatchOutcome, FootprintResult},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn print_footprint_report(request: &FootprintRequest, result: &FootprintResult) {
    println!("\n--- [Footprint Report] ---");
    println!("========================================");
    println!(
        "Product: {} x {} | {} -> {} by {}",
        request.product_name.trim(),
        request.quantity,
        request.origin_country.trim().to_uppercase(),
        request.destination_country.trim().to_uppercase(),
        request.transport_mode
    );
    println!("----------------------------------------");
    println!("  - Total Emissions:          {:>12.3} kg CO2e", result.total_emissions_kg_co2e);
    println!("  - Production:               {:>12.3} kg CO2e", result.production_emissions);
    println!("  - Transport:                {:>12.3} kg CO2e", result.transport_emissions);

    let production = &result.production_breakdown;
    println!("\nProduction Breakdown:");
    println!("  - Energy:                   {:>12.3} kg CO2e", production.energy_emissions);
    println!("  - Materials:                {:>12.3} kg CO2e", production.material_emissions);
    for (material, emissions) in &production.material_breakdown {
        println!("    - {}: {:.3} kg CO2e", material, emissions);
    }
    println!("  - Process:                  {:>12.3} kg CO2e", production.process_emissions);

    let transport = &result.transport_breakdown;
    println!("\nTransport Breakdown:");
    println!(
        "  - Route:                    {:>12.1} km, {:.2} kg shipped",
        transport.distance_km, transport.weight_kg
    );
    println!("  - Direct:                   {:>12.3} kg CO2e", transport.direct_emissions);
    println!("  - Upstream Fuel:            {:>12.3} kg CO2e", transport.upstream_fuel);
    println!("  - Infrastructure:           {:>12.3} kg CO2e", transport.infrastructure);

    println!("\nGHG Protocol Scopes:");
    println!("  - Scope 1:                  {:>12.3} kg CO2e", result.scope_1_emissions);
    println!("  - Scope 2:                  {:>12.3} kg CO2e", result.scope_2_emissions);
    println!("  - Scope 3:                  {:>12.3} kg CO2e", result.scope_3_emissions);

    println!("\nQuality:");
    println!("  - Confidence:               {:>11.1}%", result.confidence_percent);
    println!(
        "  - Uncertainty (overall):    {:>11.1}%",
        result.uncertainty_analysis.overall_uncertainty
    );
    println!("  - Carbon Cost:              ${:>11.2} USD", result.carbon_cost_usd);
    println!("  - Response Time:            {:>9.2} ms", result.response_time_ms);

    if !result.carbon_trading_opportunities.is_empty() {
        println!("\nTrading Opportunities:");
        for opportunity in &result.carbon_trading_opportunities {
            println!(
                "  - {:<24} ${:>10.2} at ${:.2}/t ({})",
                opportunity.market.market,
                opportunity.potential_value_usd,
                opportunity.market.price_per_tonne,
                opportunity.market.requirements
            );
        }
    }

    if !result.recommendations.is_empty() {
        println!("\nRecommendations:");
        for advice in &result.recommendations {
            println!(
                "  - [{:?}] {} ({})",
                advice.priority, advice.action, advice.potential_reduction
            );
        }
    }
    println!("========================================");
}

pub fn print_batch_summary(outcome: &BatchOutcome) {
    println!("\n--- [Batch Summary] ---");
    println!("========================================");
    println!(
        "Requests: {} | Succeeded: {} | Failed: {} | {:.1} ms",
        outcome.total_calculations,
        outcome.successful_calculations,
        outcome.failed_calculations,
        outcome.processing_time_ms
    );
    if let Some(summary) = &outcome.summary {
        println!("  - Total Emissions:   {:>12.3} kg CO2e", summary.total_emissions_kg_co2e);
        println!("  - Average Emissions: {:>12.3} kg CO2e", summary.average_emissions_kg_co2e);
        println!(
            "  - Range:             {:.3} .. {:.3} kg CO2e",
            summary.min_emissions_kg_co2e, summary.max_emissions_kg_co2e
        );
        println!("  - Total Carbon Cost: ${:>11.2} USD", summary.total_carbon_cost_usd);
    }
    for error in &outcome.errors {
        println!("  ! Request #{} failed: {}", error.index, error.error);
    }
    println!("========================================");
}

pub fn generate_results_table(requests: &[FootprintRequest], outcome: &BatchOutcome) -> String {
    let mut table = String::from(
        "| # | Product | Route | Mode | Total (kg CO2e) | Scope 1 | Scope 2 | Scope 3 | Confidence |\n",
    );
    table.push_str("|---|---------|-------|------|-----------------|---------|---------|---------|------------|\n");

    for item in &outcome.results {
        let Some(request) = requests.get(item.index) else {
            continue;
        };
        let r = &item.result;
        table.push_str(&format!(
            "| {} | {} | {} -> {} | {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.1}% |\n",
            item.index,
            request.product_name.trim(),
            request.origin_country.trim().to_uppercase(),
            request.destination_country.trim().to_uppercase(),
            request.transport_mode,
            r.total_emissions_kg_co2e,
            r.scope_1_emissions,
            r.scope_2_emissions,
            r.scope_3_emissions,
            r.confidence_percent
        ));
    }
    table
}

fn generate_report(requests: &[FootprintRequest], outcome: &BatchOutcome) -> String {
    let mut report = String::from("# GreenAlpha Batch Report\n\n");
    report.push_str(&format!(
        "{} requests, {} succeeded, {} failed.\n\n",
        outcome.total_calculations, outcome.successful_calculations, outcome.failed_calculations
    ));

    report.push_str("## Results\n\n");
    report.push_str(&generate_results_table(requests, outcome));

    if let Some(summary) = &outcome.summary {
        report.push_str("\n## Summary\n\n");
        report.push_str(&format!(
            "- Total emissions: {:.3} kg CO2e\n- Average emissions: {:.3} kg CO2e\n- Minimum: {:.3} kg CO2e\n- Maximum: {:.3} kg CO2e\n- Total carbon cost: ${:.2}\n",
            summary.total_emissions_kg_co2e,
            summary.average_emissions_kg_co2e,
            summary.min_emissions_kg_co2e,
            summary.max_emissions_kg_co2e,
            summary.total_carbon_cost_usd
        ));
    }

    if !outcome.errors.is_empty() {
        report.push_str("\n## Errors\n\n");
        for error in &outcome.errors {
            report.push_str(&format!("- Request #{}: {}\n", error.index, error.error));
        }
    }
    report
}

/// Writes `results.csv` and `report.md` for a batch into `run_dir`.
pub fn write_batch_outputs(
    run_dir: &Path,
    requests: &[FootprintRequest],
    outcome: &BatchOutcome,
) -> Result<PathBuf> {
    fs::create_dir_all(run_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", run_dir))?;

    let csv_path = run_dir.join("results.csv");
    let mut logger = ResultLogger::new(&csv_path)?;
    for item in &outcome.results {
        if let Some(request) = requests.get(item.index) {
            logger.log_result(request, &item.result)?;
        }
    }

    let report_path = run_dir.join("report.md");
    fs::write(&report_path, generate_report(requests, outcome))
        .with_context(|| format!("Failed to write report {:?}", report_path))?;

    Ok(run_dir.to_path_buf())
}

pub fn print_country_profile(profile: &CountryProfile) {
    println!("\n--- [Country Profile: {} ({})] ---", profile.display_name, profile.code);
    println!("  - Latest Year:          {}", profile.latest_year);
    println!("  - Total Emissions:      {:.0} t CO2", profile.total_emissions_tonnes);
    println!("  - Per Capita:           {:.2} t CO2", profile.per_capita_emissions);
    println!("  - Electricity Factor:   {:.3} kg CO2e/kWh", profile.electricity_factor);
    println!("  - Energy Mix:");
    for (source, share) in &profile.energy_mix {
        println!("    - {}: {:.0}%", source, share);
    }
    println!("  - Recent Trend:");
    for point in &profile.historical_trend {
        println!("    - {}: {:.0} t", point.year, point.emissions_tonnes);
    }
}

pub fn print_history(country_code: &str, records: &[EmissionRecord]) {
    println!("\n--- [Emission History: {}] ---", country_code);
    if records.is_empty() {
        println!("No records found.");
        return;
    }
    for record in records {
        println!("  {} | {:>16.0} t CO2", record.year, record.emissions_tonnes);
    }
}

pub fn print_search_results(query: &str, results: &[CountrySummary]) {
    println!("\n--- [Search: '{}'] ---", query);
    if results.is_empty() {
        println!("No matching countries.");
        return;
    }
    for summary in results {
        println!(
            "  {} | {:<32} | {} | {:>16.0} t CO2",
            summary.code, summary.name, summary.latest_year, summary.total_emissions_tonnes
        );
    }
}

pub fn print_global_statistics(stats: &GlobalStatistics) {
    println!("\n--- [Global Statistics] ---");
    println!("  - Countries:            {}", stats.total_countries);
    println!("  - Latest Year:          {}", stats.latest_year);
    println!("  - Global Emissions:     {:.0} t CO2", stats.global_emissions_tonnes);
    println!(
        "  - Coverage:             {}-{} ({} records)",
        stats.data_coverage.first_year, stats.data_coverage.last_year, stats.data_coverage.total_records
    );
    println!("  - Top Emitters:");
    for (rank, emitter) in stats.top_emitters.iter().enumerate() {
        println!(
            "    {:>2}. {} ({}) {:.0} t",
            rank + 1,
            emitter.country,
            emitter.code,
            emitter.emissions_tonnes
        );
    }
}

pub fn print_emission_factors(store: &ReferenceDataStore) {
    println!("\n--- [Emission Factors] ---");
    for (name, factor) in store.emission_factors() {
        println!(
            "  {:<24} {:>8.3} {:<14} {} {} (±{:.0}%)",
            name, factor.value, factor.unit, factor.source, factor.reference_year, factor.uncertainty_percent
        );
    }
    println!("\n--- [Carbon Prices] ---");
    for (market, price) in store.carbon_prices() {
        println!("  {:<24} ${:>7.2}/t", market, price);
    }
}

pub fn print_transport_modes(store: &ReferenceDataStore) {
    println!("\n--- [Transport Modes] ---");
    for factor in store.transport_factors() {
        println!(
            "  {:<9} {:>7.3} {} x{:.1} ({}, ±{:.0}%) {}",
            factor.mode,
            factor.factor.value,
            factor.factor.unit,
            factor.adjustment,
            factor.factor.source,
            factor.factor.uncertainty_percent,
            factor.description
        );
    }
}

pub fn print_products(store: &ReferenceDataStore) {
    println!("\n--- [Product Catalog] ---");
    for product in store.products() {
        let materials: Vec<String> = product
            .profile
            .material_footprint
            .iter()
            .map(|(m, kg)| format!("{} {:.3} kg", m, kg))
            .collect();
        println!(
            "  {:<20} {:>7.1} kWh/unit, {:.2} kg/unit | {}",
            product.product_name,
            product.profile.energy_intensity,
            product.unit_weight_kg,
            materials.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenalpha_core::engine::builder::FootprintEngineBuilder;

    #[tokio::test]
    async fn test_batch_outputs_are_written() {
        let engine = FootprintEngineBuilder::new().build().unwrap();
        let requests = vec![
            FootprintRequest::new("smartphone", 500.0, "CHN", "DEU", "sea"),
            FootprintRequest::new("laptop", 0.0, "CHN", "DEU", "sea"),
            FootprintRequest::new("coffee_1kg", 100.0, "BRA", "USA", "road"),
        ];
        let outcome = engine.calculate_batch(&requests).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let run_dir = write_batch_outputs(&dir.path().join("run"), &requests, &outcome).unwrap();

        let csv = fs::read_to_string(run_dir.join("results.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let report = fs::read_to_string(run_dir.join("report.md")).unwrap();
        assert!(report.contains("| 0 | smartphone | CHN -> DEU | sea |"));
        assert!(report.contains("| 2 | coffee_1kg | BRA -> USA | road |"));
        assert!(report.contains("## Errors"));
        assert!(report.contains("Request #1"));
    }

    #[test]
    fn test_results_table_header() {
        let outcome = BatchOutcome {
            total_calculations: 0,
            successful_calculations: 0,
            failed_calculations: 0,
            processing_time_ms: 0.0,
            results: Vec::new(),
            errors: Vec::new(),
            summary: None,
        };
        let table = generate_results_table(&[], &outcome);
        assert_eq!(table.lines().count(), 2);
        assert!(table.starts_with("| # | Product |"));
    }
}
