//! Sentinel CLI Configuration
//!
//! Pipeline settings come from an optional TOML file; command-line flags
//! override individual fields afterwards. Missing fields keep their defaults.

use crate::error::Result;
use sentinel_core::{DuplicatePolicy, PipelineConfig};
use std::path::Path;
use tracing::info;

/// Command-line overrides applied on top of the loaded file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub compute_workers: Option<usize>,
    pub id_shift: Option<u32>,
    pub duplicate_policy: Option<DuplicatePolicy>,
}

/// Parse a pipeline configuration from TOML text
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    Ok(toml::from_str(content)?)
}

/// Load the configuration file, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            parse_config(&std::fs::read_to_string(path)?)
        }
        None => {
            info!("Using default configuration");
            Ok(PipelineConfig::default())
        }
    }
}

/// Apply overrides and validate the result
pub fn resolve_config(mut config: PipelineConfig, overrides: Overrides) -> Result<PipelineConfig> {
    if let Some(workers) = overrides.compute_workers {
        config.compute_workers = workers;
    }
    if let Some(shift) = overrides.id_shift {
        config.id_shift = shift;
    }
    if let Some(policy) = overrides.duplicate_policy {
        config.duplicate_policy = policy;
    }
    config.validate()?;
    Ok(config)
}
