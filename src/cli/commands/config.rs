//! Config Command
//!
//! Manage DisasterGuard configuration.
//!
//! Usage:
//!   disasterguard config show [-f json]
//!   disasterguard config path
//!   disasterguard config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::{GuardError, Result};

/// Show the merged effective configuration (credential never printed)
pub fn show(format: &str) -> Result<()> {
    match format {
        "json" => ConfigLoader::show_config(true),
        "toml" | "text" => ConfigLoader::show_config(false),
        other => Err(GuardError::Config(format!(
            "Unknown format '{}'. Valid values: text, toml, json",
            other
        ))),
    }
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write a default config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = ConfigLoader::init(global, force)?;
    Output::new().success(&format!(
        "{} configuration: {}",
        if global { "Global" } else { "Project" },
        path.display()
    ));
    Ok(())
}
