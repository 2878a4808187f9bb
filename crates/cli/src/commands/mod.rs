//! Command implementations.

mod run;
mod simulate;
mod validate;

pub use run::run_pipeline;
pub use simulate::run_simulate;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::StationConfig;
use tracing::info;

use crate::error::CliError;

/// Load the station configuration, or defaults when no file is given
fn load_station(path: Option<&Path>) -> Result<StationConfig> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Ok(StationConfig::default());
    };

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    info!(config = %path.display(), "Loading configuration");
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
