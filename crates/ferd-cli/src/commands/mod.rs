//! CLI subcommands.

pub mod attachments;
pub mod batch;
pub mod config;
pub mod extract;

use std::path::Path;

use ferd_core::FerdConfig;

/// Load configuration from an explicit path, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FerdConfig> {
    if let Some(path) = config_path {
        return Ok(FerdConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(FerdConfig::from_file(&default_path)?)
    } else {
        Ok(FerdConfig::default())
    }
}
