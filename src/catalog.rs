//! JSON catalogs and configuration files.

use crate::domain::{OptimizerConfig, Platform, validate_platforms};
use crate::error::LoadError;
use std::path::Path;

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::ReadFile {
        path: path.display().to_string(),
        source,
    })
}

/// Parse a JSON catalog: `[{"name": ..., "margin": ..., "bounds": [min, max]}, ...]`.
pub fn parse_catalog(json: &str) -> Result<Vec<Platform>, LoadError> {
    let platforms: Vec<Platform> = serde_json::from_str(json).map_err(LoadError::Parse)?;
    validate_platforms(&platforms)?;
    Ok(platforms)
}

pub fn load_catalog(path: &Path) -> Result<Vec<Platform>, LoadError> {
    parse_catalog(&read(path)?)
}

/// Load an [`OptimizerConfig`]; omitted fields keep their defaults.
pub fn load_config(path: &Path) -> Result<OptimizerConfig, LoadError> {
    serde_json::from_str(&read(path)?).map_err(LoadError::Parse)
}

/// Eight-platform book catalog.
pub fn demo_catalog() -> Vec<Platform> {
    vec![
        Platform::new("MoKa Reads Shop", 0.87, 10.0, 25.0),
        Platform::new("KDP Paperback", 0.60, 15.0, 50.0),
        Platform::new("KDP Ebook", 0.35, 10.0, 40.0),
        Platform::new("Leanpub", 0.80, 10.0, 28.0),
        Platform::new("Kobo", 0.70, 10.0, 28.0),
        Platform::new("Google Books", 0.70, 10.0, 28.0),
        Platform::new("B&N Ebook", 0.70, 10.0, 28.0),
        Platform::new("B&N Print", 0.55, 15.0, 50.0),
    ]
}
