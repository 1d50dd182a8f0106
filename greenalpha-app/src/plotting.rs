//! PNG charts for emission histories and batch runs.

use anyhow::Result;
use greenalpha_schemas::{country::EmissionRecord, result::BatchOutcome};
use plotters::prelude::*;
use std::path::Path;

/// Line chart of annual emissions (million tonnes) for one country.
pub fn plot_history(path: &Path, country_code: &str, records: &[EmissionRecord]) -> Result<()> {
    if records.is_empty() {
        println!("[Plotting] Warning: No history to plot for {}.", country_code);
        return Ok(());
    }

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let first_year = records.first().map_or(0, |r| r.year);
    let last_year = records.last().map_or(first_year, |r| r.year).max(first_year + 1);
    let max_mt = records
        .iter()
        .map(|r| r.emissions_tonnes / 1e6)
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Annual CO2 Emissions: {}", country_code),
            ("sans-serif", 40).into_font(),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(first_year..last_year, 0f64..(max_mt * 1.1).max(1.0))?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Emissions (Mt CO2)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            records.iter().map(|r| (r.year, r.emissions_tonnes / 1e6)),
            BLUE.stroke_width(2),
        ))?
        .label(country_code)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.filled()));

    chart.draw_series(
        records
            .iter()
            .map(|r| Circle::new((r.year, r.emissions_tonnes / 1e6), 3, BLUE.filled())),
    )?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Stacked scope 1/2/3 bars, one per successful batch item.
pub fn plot_batch_scopes(path: &Path, outcome: &BatchOutcome) -> Result<()> {
    if outcome.results.is_empty() {
        println!("[Plotting] Warning: No successful results to plot.");
        return Ok(());
    }

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_total = outcome
        .results
        .iter()
        .map(|item| item.result.total_emissions_kg_co2e)
        .fold(0.0, f64::max);
    let bars = outcome.results.len() as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption("Emissions by Scope per Request", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..bars, 0f64..(max_total * 1.1).max(1.0))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Request")
        .y_desc("kg CO2e")
        .x_label_formatter(&|x| format!("#{}", *x as usize))
        .draw()?;

    let layers = [
        ("Scope 1 (process)", RED),
        ("Scope 2 (electricity)", GREEN),
        ("Scope 3 (materials + transport)", BLUE),
    ];

    for (layer, (label, color)) in layers.iter().enumerate() {
        let rects = outcome.results.iter().enumerate().map(|(i, item)| {
            let r = &item.result;
            let scopes = [r.scope_1_emissions, r.scope_2_emissions, r.scope_3_emissions];
            let base: f64 = scopes[..layer].iter().sum();
            let x = i as f64;
            Rectangle::new([(x + 0.15, base), (x + 0.85, base + scopes[layer])], color.filled())
        });
        let color = *color;
        chart
            .draw_series(rects)?
            .label(*label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
