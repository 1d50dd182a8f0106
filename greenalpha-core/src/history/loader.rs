use crate::error::EngineError;
use greenalpha_schemas::country::EmissionRecord;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Parsed contents of the tabular source, grouped by country and sorted by
/// (code, year).
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub by_country: BTreeMap<String, Vec<EmissionRecord>>,
    pub total_records: usize,
    /// Rows without a country code (regional and global aggregates).
    pub dropped_rows: usize,
    /// Rows whose year or emissions could not be parsed.
    pub skipped_rows: usize,
}

/// Reads `entity, code, year, emissions_tonnes` by column position after a
/// header row. Duplicate (code, year) rows keep the last occurrence.
pub fn load_records(path: &Path) -> Result<LoadedRecords, EngineError> {
    let path_str = path.display().to_string();
    if !path.is_file() {
        return Err(EngineError::DataUnavailable(format!(
            "source file '{}' not found",
            path_str
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| EngineError::CsvError(path_str.clone(), e))?;

    let mut grouped: BTreeMap<String, BTreeMap<i32, EmissionRecord>> = BTreeMap::new();
    let mut loaded = LoadedRecords::default();

    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                debug!(line = line + 2, error = %e, "Unreadable CSV row");
                loaded.skipped_rows += 1;
                continue;
            }
        };

        let code = row.get(1).unwrap_or_default();
        if code.is_empty() {
            loaded.dropped_rows += 1;
            continue;
        }

        let year = row.get(2).and_then(|v| v.parse::<i32>().ok());
        let emissions = row
            .get(3)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite());
        let (Some(year), Some(emissions_tonnes)) = (year, emissions) else {
            debug!(line = line + 2, "Unparsable year or emissions value");
            loaded.skipped_rows += 1;
            continue;
        };

        let record = EmissionRecord {
            entity: row.get(0).unwrap_or_default().to_string(),
            country_code: code.to_ascii_uppercase(),
            year,
            emissions_tonnes,
        };
        grouped
            .entry(record.country_code.clone())
            .or_default()
            .insert(year, record);
    }

    if loaded.skipped_rows > 0 {
        warn!(path = %path_str, skipped = loaded.skipped_rows, "Skipped unparsable emission rows");
    }

    loaded.by_country = grouped
        .into_iter()
        .map(|(code, years)| (code, years.into_values().collect::<Vec<_>>()))
        .collect();
    loaded.total_records = loaded.by_country.values().map(Vec::len).sum();
    Ok(loaded)
}
