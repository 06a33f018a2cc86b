use console::style;

use crate::types::{PredictionResult, RiskLevel};

/// Styled terminal messages; status lines go to stderr so stdout stays
/// clean for JSON output.
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        eprintln!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        eprintln!("\n{}", style(message).bold().underlined());
    }

    /// One-line colored summary of a finished prediction
    pub fn prediction_summary(&self, result: &PredictionResult) {
        let level = result.overall_risk_level.to_string();
        let level = match result.overall_risk_level {
            RiskLevel::Low => style(level).green(),
            RiskLevel::Moderate => style(level).yellow(),
            RiskLevel::High => style(level).red(),
            RiskLevel::Extreme => style(level).red().bold(),
        };
        eprintln!(
            "{} {}: {} risk, {}% confidence, {} hazard(s){}",
            style("◆").cyan(),
            style(&result.location).bold(),
            level,
            result.prediction_confidence,
            result.risks.len(),
            if result.visualization_image.is_some() {
                ", visualization attached"
            } else {
                ""
            }
        );
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
