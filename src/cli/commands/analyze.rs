//! Analyze Command
//!
//! Runs one prediction locally and prints the result JSON to stdout.
//!
//! Usage:
//!   disasterguard analyze "Miami, FL" [--lang es] [--reports reports.json]
//!                         [--no-enrichment] [--compact]

use std::path::PathBuf;

use crate::analysis::RiskAnalyzer;
use crate::cli::ui::Output;
use crate::cli::util::read_reports;
use crate::config::Config;
use crate::types::{Language, PredictionRequest, PredictionResult, Result};

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub location: String,
    pub lang: Language,
    pub reports: Option<PathBuf>,
    pub compact: bool,
}

/// Assemble the request the API would have received
pub fn build_request(options: &AnalyzeOptions) -> Result<PredictionRequest> {
    let reports = match &options.reports {
        Some(path) => read_reports(path)?,
        None => Vec::new(),
    };

    let request = PredictionRequest::new(options.location.clone())
        .with_lang(options.lang)
        .with_reports(reports);
    request.validate()?;
    Ok(request)
}

pub fn render(result: &PredictionResult, compact: bool) -> Result<String> {
    let rendered = if compact {
        serde_json::to_string(result)?
    } else {
        serde_json::to_string_pretty(result)?
    };
    Ok(rendered)
}

pub async fn run(config: &Config, options: AnalyzeOptions) -> Result<()> {
    let output = Output::new();
    let request = build_request(&options)?;
    let analyzer = RiskAnalyzer::from_config(config)?;

    output.info(&format!(
        "Analyzing {} ({}, {} report(s))",
        request.location,
        request.lang.display_name(),
        request.reports.len()
    ));

    let result = analyzer.analyze(&request).await?;

    let out_of_range = result.out_of_range_fields();
    if !out_of_range.is_empty() {
        output.warning(&format!("Out-of-range values: {}", out_of_range.join(", ")));
    }
    output.prediction_summary(&result);

    println!("{}", render(&result, options.compact)?);
    Ok(())
}
