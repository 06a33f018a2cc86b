//! Prediction data model
//!
//! Request and result shapes exchanged with API callers. Field names on the
//! wire are camelCase. Every entity lives for a single request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::{GuardError, Result};
use super::utils::ParseWithDefault;
use crate::constants::score;

// =============================================================================
// Enumerations
// =============================================================================

/// Output language for generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    Hi,
}

impl Language {
    /// Language name embedded in prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::Hi => "Hindi",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Hi => "hi",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "hi" => Ok(Language::Hi),
            _ => Err(format!(
                "Unknown language: {}. Valid values: en, es, fr, hi",
                s
            )),
        }
    }
}

/// Severity a community member assigns to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportSeverity {
    Minor,
    Moderate,
    Severe,
}

impl fmt::Display for ReportSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportSeverity::Minor => write!(f, "Minor"),
            ReportSeverity::Moderate => write!(f, "Moderate"),
            ReportSeverity::Severe => write!(f, "Severe"),
        }
    }
}

/// Overall risk classification for a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Moderate => write!(f, "Moderate"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Extreme => write!(f, "Extreme"),
        }
    }
}

impl ParseWithDefault for RiskLevel {
    fn type_name() -> &'static str {
        "RiskLevel"
    }

    fn default_value() -> Self {
        RiskLevel::Moderate
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "moderate" => Some(RiskLevel::Moderate),
            "high" => Some(RiskLevel::High),
            "extreme" => Some(RiskLevel::Extreme),
            _ => None,
        }
    }
}

/// Severity of an individual hazard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ParseWithDefault for RiskSeverity {
    fn type_name() -> &'static str {
        "RiskSeverity"
    }

    fn default_value() -> Self {
        RiskSeverity::Medium
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(RiskSeverity::Low),
            "medium" => Some(RiskSeverity::Medium),
            "high" => Some(RiskSeverity::High),
            "critical" => Some(RiskSeverity::Critical),
            _ => None,
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// Hazard observation submitted by a community member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReport {
    pub id: String,
    #[serde(rename = "type")]
    pub hazard_type: String,
    pub description: String,
    pub severity: ReportSeverity,
    /// Opaque client timestamp, passed through as given
    pub timestamp: String,
    pub location: String,
}

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub location: String,
    #[serde(default)]
    pub reports: Vec<UserReport>,
    #[serde(default)]
    pub lang: Language,
}

impl PredictionRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            reports: Vec::new(),
            lang: Language::default(),
        }
    }

    pub fn with_lang(mut self, lang: Language) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_reports(mut self, reports: Vec<UserReport>) -> Self {
        self.reports = reports;
        self
    }

    /// Shape checks serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(GuardError::InvalidRequest(
                "location must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Result
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterRisk {
    #[serde(rename = "type")]
    pub risk_type: String,
    pub probability: i64,
    pub severity: RiskSeverity,
    pub description: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalTrend {
    pub period: String,
    pub event_count: i64,
    pub intensity_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureHotspot {
    pub location: String,
    pub threat: String,
    pub timeframe: String,
    pub reasoning: String,
    pub probability_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FutureForecast {
    pub long_term_outlook: String,
    pub vulnerability_score: i64,
    pub hotspots: Vec<FutureHotspot>,
}

/// Provenance figures echoed from the model output, never computed locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub data_points_analyzed: i64,
    pub training_epochs: i64,
    pub neural_accuracy: f64,
    pub algorithm_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// Canonical response of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub location: String,
    pub overall_risk_level: RiskLevel,
    pub prediction_confidence: i64,
    pub summary: String,
    pub community_insights: String,
    pub risks: Vec<DisasterRisk>,
    pub historical_trends: Vec<HistoricalTrend>,
    pub model_metadata: ModelMetadata,
    pub future_forecast: FutureForecast,
    #[serde(default)]
    pub visualization_image: Option<String>,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
    #[serde(default)]
    pub active_alerts: Vec<Value>,
    /// ISO-8601 UTC instant the result was built
    pub timestamp: String,
}

impl PredictionResult {
    /// Names of percentage fields whose values fall outside [0, 100].
    ///
    /// Values are reported, never altered.
    pub fn out_of_range_fields(&self) -> Vec<String> {
        let in_range = |v: i64| (score::MIN..=score::MAX).contains(&v);
        let mut fields = Vec::new();

        if !in_range(self.prediction_confidence) {
            fields.push("predictionConfidence".to_string());
        }
        for (idx, risk) in self.risks.iter().enumerate() {
            if !in_range(risk.probability) {
                fields.push(format!("risks[{}].probability", idx));
            }
        }
        if !in_range(self.future_forecast.vulnerability_score) {
            fields.push("futureForecast.vulnerabilityScore".to_string());
        }
        for (idx, hotspot) in self.future_forecast.hotspots.iter().enumerate() {
            if !in_range(hotspot.probability_score) {
                fields.push(format!("futureForecast.hotspots[{}].probabilityScore", idx));
            }
        }

        fields
    }

    /// The highest-listed hazard, used to theme the visualization
    pub fn top_risk(&self) -> Option<&DisasterRisk> {
        self.risks.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let req: PredictionRequest = serde_json::from_value(json!({"location": "Miami"})).unwrap();
        assert_eq!(req.lang, Language::En);
        assert!(req.reports.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_request_rejects_unknown_language() {
        let err = serde_json::from_value::<PredictionRequest>(
            json!({"location": "Lyon", "lang": "de"}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_request_rejects_blank_location() {
        let req = PredictionRequest::new("   ");
        assert!(matches!(req.validate(), Err(GuardError::InvalidRequest(_))));
    }

    #[test]
    fn test_user_report_wire_format() {
        let report: UserReport = serde_json::from_value(json!({
            "id": "r1",
            "type": "Flood",
            "description": "Street underwater",
            "severity": "Severe",
            "timestamp": "yesterday",
            "location": "Brickell"
        }))
        .unwrap();
        assert_eq!(report.hazard_type, "Flood");
        assert_eq!(report.severity, ReportSeverity::Severe);

        let bad = serde_json::from_value::<UserReport>(json!({
            "id": "r2", "type": "Fire", "description": "", "severity": "Extreme",
            "timestamp": "", "location": ""
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_language_names() {
        assert_eq!(Language::Hi.display_name(), "Hindi");
        assert_eq!("FR".parse::<Language>().unwrap(), Language::Fr);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!(RiskLevel::try_parse("extreme"), Some(RiskLevel::Extreme));
        assert_eq!(RiskLevel::try_parse("apocalyptic"), None);
        assert_eq!(RiskSeverity::try_parse(" Critical "), Some(RiskSeverity::Critical));
    }

    #[test]
    fn test_enum_field_defaults_only_when_absent() {
        let v = json!({"level": "Critical", "blank": " ", "num": 3, "ok": "low"});
        assert_eq!(
            RiskLevel::from_json_field(&v, "", "missing").unwrap(),
            RiskLevel::Moderate
        );
        assert_eq!(
            RiskLevel::from_json_field(&v, "", "blank").unwrap(),
            RiskLevel::Moderate
        );
        assert_eq!(RiskLevel::from_json_field(&v, "", "ok").unwrap(), RiskLevel::Low);

        let err = RiskLevel::from_json_field(&v, "", "level").unwrap_err();
        assert!(matches!(err, GuardError::MalformedResponse(_)));
        assert!(err.to_string().contains("'Critical'"));
        assert!(RiskSeverity::from_json_field(&v, "risks[0].", "num").is_err());
    }

    fn sample_result() -> PredictionResult {
        PredictionResult {
            location: "X".into(),
            overall_risk_level: RiskLevel::High,
            prediction_confidence: 80,
            summary: String::new(),
            community_insights: String::new(),
            risks: vec![DisasterRisk {
                risk_type: "Flood".into(),
                probability: 120,
                severity: RiskSeverity::High,
                description: String::new(),
                recommendations: vec![],
            }],
            historical_trends: vec![],
            model_metadata: ModelMetadata::default(),
            future_forecast: FutureForecast::default(),
            visualization_image: None,
            sources: vec![],
            active_alerts: vec![],
            timestamp: "2024-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let value = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(value["overallRiskLevel"], "High");
        assert_eq!(value["risks"][0]["type"], "Flood");
        assert_eq!(value["futureForecast"]["longTermOutlook"], "");
        assert_eq!(value["modelMetadata"]["algorithmVersion"], "");
        assert!(value["visualizationImage"].is_null());
        assert_eq!(value["activeAlerts"], json!([]));
    }

    #[test]
    fn test_out_of_range_fields() {
        let result = sample_result();
        assert_eq!(result.out_of_range_fields(), vec!["risks[0].probability"]);
    }
}
