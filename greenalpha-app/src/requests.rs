use anyhow::{bail, Context, Result};
use greenalpha_schemas::request::FootprintRequest;
use serde::Deserialize;
use std::{fs, path::Path};

/// A batch file: a list of requests under `requests:`.
#[derive(Debug, Deserialize)]
pub struct BatchRequestFile {
    pub requests: Vec<FootprintRequest>,
}

/// Reads a single request from a YAML (or JSON) file.
pub fn load_request(path: &Path) -> Result<FootprintRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse request from {:?}", path))
}

pub fn load_batch(path: &Path) -> Result<Vec<FootprintRequest>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {:?}", path))?;
    let file: BatchRequestFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse batch requests from {:?}", path))?;
    if file.requests.is_empty() {
        bail!("Batch file {:?} contains no requests", path);
    }
    Ok(file.requests)
}
