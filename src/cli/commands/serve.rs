//! Serve Command
//!
//! Usage:
//!   disasterguard serve [--host 0.0.0.0] [--port 8000] [--no-enrichment]

use crate::cli::ui::Output;
use crate::config::Config;
use crate::constants::{network, server};
use crate::types::Result;

pub async fn run(config: Config) -> Result<()> {
    let output = Output::new();

    output.header(&format!("DisasterGuard API ({})", server::ENGINE_NAME));
    output.info(&format!("Listening on http://{}", config.server.bind_address()));
    output.info(&format!(
        "Models: {} | enrichment: {}",
        config.provider.fallback_models.join(" → "),
        config.enrichment
    ));
    if !config.provider.has_api_key() {
        output.warning(&format!(
            "{} is not set; analyze requests will fail with 400",
            network::API_KEY_ENV
        ));
    }

    crate::server::serve(&config).await
}
