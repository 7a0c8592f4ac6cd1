//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<ChordGenConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {:?}", path))?;
    let config: ChordGenConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("invalid config: {:?}", path))?;
    config.validate()?;
    Ok(config)
}
