//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/disasterguard/config.toml)
//! 3. Project config (./disasterguard.toml)
//! 4. Environment variables (DISASTERGUARD_* prefix, `__` separates sections)
//! 5. GEMINI_API_KEY for the provider credential

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants::network;
use crate::types::{GuardError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. DISASTERGUARD_RETRY__BASE_DELAY_SECS -> retry.base_delay_secs
        figment = figment.merge(Env::prefixed("DISASTERGUARD_").split("__").lowercase(true));

        Self::finish(figment)
    }

    /// Load configuration from a specific file only (plus the credential)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Config> {
        let mut config: Config = figment
            .extract()
            .map_err(|e| GuardError::Config(format!("Configuration error: {}", e)))?;

        if !config.provider.has_api_key() {
            config.provider.api_key = env::var(network::API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/disasterguard/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("disasterguard"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("disasterguard.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());

        let key = if env::var(network::API_KEY_ENV).is_ok() {
            "set"
        } else {
            "not set"
        };
        println!("  Credential: {} ({})", network::API_KEY_ENV, key);
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| GuardError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a default config file, globally or in the current directory
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let path = if global {
            let dir = Self::global_dir().ok_or_else(|| {
                GuardError::Config("Cannot determine global config directory".to_string())
            })?;
            fs::create_dir_all(&dir)?;
            dir.join("config.toml")
        } else {
            Self::project_config_path()
        };

        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(path);
        }

        fs::write(&path, Self::default_config_file())?;
        info!("Created config: {}", path.display());
        Ok(path)
    }

    /// Default config file content (TOML)
    fn default_config_file() -> String {
        r#"# DisasterGuard Configuration
# The provider credential is read from GEMINI_API_KEY.

version = "1.0"

# "on" attempts a visualization image per analysis, "off" skips it
enrichment = "on"

[server]
host = "0.0.0.0"
port = 8000
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000", "*"]

[provider]
fallback_models = ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"]
image_model = "gemini-2.0-flash-exp-image-generation"
timeout_secs = 60

[retry]
max_retries = 3
base_delay_secs = 5
"#
        .to_string()
    }
}
