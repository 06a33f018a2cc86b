//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/disasterguard/config.toml)
//! 3. Project config (./disasterguard.toml)
//! 4. Environment variables (DISASTERGUARD_*, GEMINI_API_KEY)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
