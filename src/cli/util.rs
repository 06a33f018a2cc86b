//! CLI Common Utilities
//!
//! Config resolution with command-line overrides, and report file loading.

use std::fs;
use std::path::Path;

use crate::config::{Config, ConfigLoader, EnrichmentMode};
use crate::types::{GuardError, Result, UserReport};

/// Command-line values that take precedence over every config layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub no_enrichment: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_enrichment {
            config.enrichment = EnrichmentMode::Off;
        }
    }
}

/// Resolve configuration: an explicit file replaces the global/project
/// search, then CLI overrides are applied and the result re-validated.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(GuardError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            ConfigLoader::load_from_file(path)?
        }
        None => ConfigLoader::load()?,
    };

    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Read a JSON array of reports in the same shape the API accepts
pub fn read_reports(path: &Path) -> Result<Vec<UserReport>> {
    let content = fs::read_to_string(path).map_err(|e| {
        GuardError::InvalidRequest(format!("Cannot read reports file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        GuardError::InvalidRequest(format!("Invalid reports file {}: {}", path.display(), e))
    })
}
