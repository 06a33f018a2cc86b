//! Prompt Builder
//!
//! Section-based prompt construction for the prediction and visualization
//! calls. The prediction prompt embeds the location, target language,
//! submitted reports and an explicit JSON example of the expected output.

use serde_json::{Value, json};

use crate::types::{PredictionRequest, UserReport};

/// Trailing directive appended to every prediction prompt
pub const JSON_ONLY_DIRECTIVE: &str = "IMPORTANT: Respond ONLY with a single valid JSON object (not an array). No markdown, no explanation.";

/// Used when the result names no hazard
pub const DEFAULT_RISK_TYPE: &str = "natural disaster";

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Bulleted list under a header
    List { header: String, items: Vec<String> },
    /// JSON example introduced by a label
    Schema { label: String, example: Value },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add text section
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add a bulleted list; skipped entirely when `items` is empty
    pub fn list(mut self, header: &str, items: Vec<String>) -> Self {
        if !items.is_empty() {
            self.sections.push(PromptSection::List {
                header: header.to_string(),
                items,
            });
        }
        self
    }

    /// Add a JSON output example
    pub fn schema(mut self, label: &str, example: Value) -> Self {
        self.sections.push(PromptSection::Schema {
            label: label.to_string(),
            example,
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::List { header, items } => {
                    prompt.push_str(&format!("# {}\n", header));
                    for item in items {
                        prompt.push_str(&format!("- {}\n", item));
                    }
                    prompt.push('\n');
                }
                PromptSection::Schema { label, example } => {
                    prompt.push_str(&label);
                    prompt.push('\n');
                    let rendered =
                        serde_json::to_string_pretty(&example).unwrap_or_else(|_| example.to_string());
                    prompt.push_str(&rendered);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Example of the object the model must return, with `location` filled in
pub fn prediction_schema_example(location: &str) -> Value {
    json!({
        "location": location,
        "overallRiskLevel": "Low | Moderate | High | Extreme",
        "predictionConfidence": "0-100",
        "summary": "Technical briefing",
        "communityInsights": "Pattern analysis",
        "historicalTrends": [
            { "period": "Last 5 Years", "eventCount": 10, "intensityScore": 7 }
        ],
        "modelMetadata": {
            "dataPointsAnalyzed": 750000,
            "trainingEpochs": 256,
            "neuralAccuracy": 96.4,
            "algorithmVersion": "NG-X-9"
        },
        "futureForecast": {
            "longTermOutlook": "Outlook string",
            "vulnerabilityScore": 85,
            "hotspots": [{
                "location": "Area",
                "threat": "Flood",
                "timeframe": "Summer",
                "reasoning": "Reason",
                "probabilityScore": 75
            }]
        },
        "risks": [{
            "type": "Fire",
            "probability": 40,
            "severity": "High",
            "description": "Desc",
            "recommendations": ["Ref"]
        }]
    })
}

fn describe_report(report: &UserReport) -> String {
    let mut line = format!(
        "[{}] {} at {}: {}",
        report.severity,
        report.hazard_type,
        report.location,
        report.description.trim()
    );
    if !report.timestamp.is_empty() {
        line.push_str(&format!(" (reported {})", report.timestamp));
    }
    line
}

/// Full prompt for the structured prediction call
pub fn build_prediction_prompt(request: &PredictionRequest) -> String {
    let location = request.location.trim();
    let reports = request.reports.iter().map(describe_report).collect();

    PromptBuilder::new()
        .text(&format!(
            "ACT AS A NEURAL DISASTER PREDICTION MODEL (V4.2).\n\
             Analyze {} in {}. Use historical patterns and live grounding.\n\
             Provide a detailed prediction including current risks, future 12-month hotspots, \
             and simulated model metadata.",
            location,
            request.lang.display_name()
        ))
        .list(
            "Community hazard reports (weigh these against historical patterns)",
            reports,
        )
        .schema("Format as JSON:", prediction_schema_example(location))
        .text(JSON_ONLY_DIRECTIVE)
        .build()
}

/// Prompt for the best-effort visualization image
pub fn build_visualization_prompt(location: &str, risk_level: &str, risk_type: &str) -> String {
    format!(
        "A futuristic, high-tech digital 2.5D schematic map visualization showing a \
         {} risk of {} in {}. Detailed neon HUD elements, warning markers, and \
         topographical heatmaps. Cinematic lighting, deep blue and red aesthetic.",
        risk_level, risk_type, location
    )
}
