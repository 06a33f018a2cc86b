//! Response Normalizer
//!
//! Turns the raw text of a prediction call into a `PredictionResult`.
//! Fields are extracted one by one rather than overlaid wholesale; only
//! absent fields take defaults, and server-owned fields (`sources`, `activeAlerts`,
//! `timestamp`, `visualizationImage`) are always set here, never read from
//! the model output.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{
    DisasterRisk, FutureForecast, FutureHotspot, GroundingSource, GuardError, HistoricalTrend,
    ModelMetadata, ParseWithDefault, PredictionResult, Result, RiskLevel, RiskSeverity,
    json_f64_field, json_i64_field, json_objects, json_string, json_string_array, json_string_or,
};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json|```").expect("code fence pattern is valid"));

/// Request-side values the normalizer needs
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// Location from the request; used when the model omits one
    pub location: String,
    /// Instant stamped into the result
    pub now: DateTime<Utc>,
    /// Grounding sources computed outside the model output
    pub sources: Vec<GroundingSource>,
}

impl NormalizeContext {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            now: Utc::now(),
            sources: Vec::new(),
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-09-01T10:00:00.000Z`
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Remove every ```` ```json ```` and ```` ``` ```` marker and trim
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Parse raw model text down to a single JSON object
pub fn parse_object(raw: &str) -> Result<Map<String, Value>> {
    let cleaned = strip_code_fences(raw);
    let parsed: Value = serde_json::from_str(&cleaned)
        .map_err(|e| GuardError::malformed(format!("response is not valid JSON: {}", e)))?;

    let value = match parsed {
        Value::Array(items) => {
            debug!(len = items.len(), "Model returned an array, taking first element");
            items
                .into_iter()
                .next()
                .unwrap_or_else(|| Value::Object(Map::new()))
        }
        other => other,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(GuardError::malformed(format!(
            "expected JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalize raw model text into the canonical result shape.
///
/// Absent fields take defaults. A field that is present but carries an
/// unknown enum value or a non-numeric score fails the whole response as
/// malformed, naming the field.
pub fn normalize(raw: &str, ctx: &NormalizeContext) -> Result<PredictionResult> {
    let data = Value::Object(parse_object(raw)?);

    let location = json_string(&data, "location")
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| ctx.location.clone());

    let risks = json_objects(&data, "risks")
        .into_iter()
        .enumerate()
        .map(|(idx, risk)| parse_risk(idx, risk))
        .collect::<Result<Vec<_>>>()?;
    let historical_trends = json_objects(&data, "historicalTrends")
        .into_iter()
        .enumerate()
        .map(|(idx, trend)| parse_trend(idx, trend))
        .collect::<Result<Vec<_>>>()?;
    let model_metadata = match data.get("modelMetadata").filter(|v| v.is_object()) {
        Some(value) => parse_metadata(value)?,
        None => ModelMetadata::default(),
    };
    let future_forecast = match data.get("futureForecast").filter(|v| v.is_object()) {
        Some(value) => parse_forecast(value)?,
        None => FutureForecast::default(),
    };

    Ok(PredictionResult {
        location,
        overall_risk_level: RiskLevel::from_json_field(&data, "", "overallRiskLevel")?,
        prediction_confidence: json_i64_field(&data, "", "predictionConfidence", 0)?,
        summary: json_string_or(&data, "summary", ""),
        community_insights: json_string_or(&data, "communityInsights", ""),
        risks,
        historical_trends,
        model_metadata,
        future_forecast,
        visualization_image: None,
        sources: ctx.sources.clone(),
        active_alerts: Vec::new(),
        timestamp: format_timestamp(ctx.now),
    })
}

fn parse_risk(idx: usize, value: &Value) -> Result<DisasterRisk> {
    let scope = format!("risks[{}].", idx);
    Ok(DisasterRisk {
        risk_type: json_string_or(value, "type", "Unknown"),
        probability: json_i64_field(value, &scope, "probability", 0)?,
        severity: RiskSeverity::from_json_field(value, &scope, "severity")?,
        description: json_string_or(value, "description", ""),
        recommendations: json_string_array(value, "recommendations"),
    })
}

fn parse_trend(idx: usize, value: &Value) -> Result<HistoricalTrend> {
    let scope = format!("historicalTrends[{}].", idx);
    Ok(HistoricalTrend {
        period: json_string_or(value, "period", ""),
        event_count: json_i64_field(value, &scope, "eventCount", 0)?,
        intensity_score: json_i64_field(value, &scope, "intensityScore", 0)?,
    })
}

fn parse_metadata(value: &Value) -> Result<ModelMetadata> {
    let scope = "modelMetadata.";
    Ok(ModelMetadata {
        data_points_analyzed: json_i64_field(value, scope, "dataPointsAnalyzed", 0)?,
        training_epochs: json_i64_field(value, scope, "trainingEpochs", 0)?,
        neural_accuracy: json_f64_field(value, scope, "neuralAccuracy", 0.0)?,
        algorithm_version: json_string_or(value, "algorithmVersion", ""),
    })
}

fn parse_forecast(value: &Value) -> Result<FutureForecast> {
    let hotspots = json_objects(value, "hotspots")
        .into_iter()
        .enumerate()
        .map(|(idx, hotspot)| parse_hotspot(idx, hotspot))
        .collect::<Result<Vec<_>>>()?;

    Ok(FutureForecast {
        long_term_outlook: json_string_or(value, "longTermOutlook", ""),
        vulnerability_score: json_i64_field(value, "futureForecast.", "vulnerabilityScore", 0)?,
        hotspots,
    })
}

fn parse_hotspot(idx: usize, value: &Value) -> Result<FutureHotspot> {
    let scope = format!("futureForecast.hotspots[{}].", idx);
    Ok(FutureHotspot {
        location: json_string_or(value, "location", ""),
        threat: json_string_or(value, "threat", ""),
        timeframe: json_string_or(value, "timeframe", ""),
        reasoning: json_string_or(value, "reasoning", ""),
        probability_score: json_i64_field(value, &scope, "probabilityScore", 0)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ctx() -> NormalizeContext {
        NormalizeContext::new("Requested Place")
            .at(Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```  "), "[1]");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_fenced_object() {
        let result = normalize("```json\n{\"location\":\"X\"}\n```", &ctx()).unwrap();
        assert_eq!(result.location, "X");
        assert!(result.sources.is_empty());
        assert!(result.active_alerts.is_empty());
        assert_eq!(result.timestamp, "2024-09-01T10:00:00.000Z");
        assert_eq!(result.visualization_image, None);
    }

    #[test]
    fn test_array_takes_first_element() {
        let result = normalize(r#"[{"location":"Y"},{"location":"Z"}]"#, &ctx()).unwrap();
        assert_eq!(result.location, "Y");
    }

    #[test]
    fn test_empty_array_becomes_empty_object() {
        let result = normalize("[]", &ctx()).unwrap();
        assert_eq!(result.location, "Requested Place");
        assert_eq!(result.overall_risk_level, RiskLevel::Moderate);
        assert!(result.risks.is_empty());
    }

    #[test]
    fn test_not_json_is_malformed() {
        assert!(matches!(
            normalize("not json", &ctx()),
            Err(GuardError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_non_object_is_malformed() {
        for raw in ["42", "\"text\"", "[7]", "null"] {
            assert!(
                matches!(normalize(raw, &ctx()), Err(GuardError::MalformedResponse(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_server_owned_fields_override_model_output() {
        let raw = json!({
            "location": "X",
            "sources": [{"title": "fake", "uri": "http://fake"}],
            "activeAlerts": [{"alert": "fake"}],
            "timestamp": "1999-01-01T00:00:00Z",
            "visualizationImage": "data:image/png;base64,AAAA"
        })
        .to_string();

        let result = normalize(&raw, &ctx()).unwrap();
        assert!(result.sources.is_empty());
        assert!(result.active_alerts.is_empty());
        assert_eq!(result.timestamp, "2024-09-01T10:00:00.000Z");
        assert_eq!(result.visualization_image, None);
    }

    #[test]
    fn test_full_payload_extraction() {
        let raw = json!({
            "location": "Miami",
            "overallRiskLevel": "high",
            "predictionConfidence": 87.6,
            "summary": "Hurricane season peak",
            "communityInsights": "Coastal flooding reports",
            "historicalTrends": [{"period": "Last 5 Years", "eventCount": "12", "intensityScore": 8}],
            "modelMetadata": {"dataPointsAnalyzed": 750000, "trainingEpochs": 256, "neuralAccuracy": 96.4, "algorithmVersion": "NG-X-9"},
            "futureForecast": {
                "longTermOutlook": "Rising",
                "vulnerabilityScore": 140,
                "hotspots": [{"location": "Keys", "threat": "Surge", "timeframe": "Fall", "reasoning": "Low elevation", "probabilityScore": 70}, "junk"]
            },
            "risks": [
                {"type": "Hurricane", "probability": 80, "severity": "Critical", "description": "Cat 4", "recommendations": ["Evacuate", 3]},
                {"type": "Flood", "probability": 55}
            ]
        })
        .to_string();

        let result = normalize(&raw, &ctx()).unwrap();
        assert_eq!(result.overall_risk_level, RiskLevel::High);
        assert_eq!(result.prediction_confidence, 88);
        assert_eq!(result.historical_trends[0].event_count, 12);
        assert_eq!(result.model_metadata.algorithm_version, "NG-X-9");
        assert_eq!(result.future_forecast.vulnerability_score, 140);
        assert_eq!(result.future_forecast.hotspots.len(), 1);
        assert_eq!(result.risks.len(), 2);
        assert_eq!(result.risks[0].severity, RiskSeverity::Critical);
        assert_eq!(result.risks[0].recommendations, vec!["Evacuate"]);
        assert_eq!(result.risks[1].severity, RiskSeverity::Medium);
        assert!(result.risks[1].recommendations.is_empty());
    }

    #[test]
    fn test_unknown_risk_level_is_rejected() {
        let err = normalize(r#"{"overallRiskLevel":"Critical"}"#, &ctx()).unwrap_err();
        assert!(matches!(err, GuardError::MalformedResponse(_)));
        assert!(err.to_string().contains("overallRiskLevel"));
    }

    #[test]
    fn test_invalid_risk_fields_are_rejected() {
        let raw = r#"{"overallRiskLevel":"High","risks":[{"type":"Flood","severity":"Severe","probability":40}]}"#;
        let err = normalize(raw, &ctx()).unwrap_err();
        assert!(err.to_string().contains("risks[0].severity"));

        let raw = r#"{"overallRiskLevel":"High","risks":[{"type":"Flood","severity":"High","probability":"N/A"}]}"#;
        let err = normalize(raw, &ctx()).unwrap_err();
        assert!(matches!(err, GuardError::MalformedResponse(_)));
        assert!(err.to_string().contains("risks[0].probability"));
    }

    #[test]
    fn test_non_numeric_nested_scores_are_rejected() {
        for raw in [
            json!({"predictionConfidence": "very"}),
            json!({"futureForecast": {"vulnerabilityScore": "high"}}),
            json!({"futureForecast": {"hotspots": [{"probabilityScore": [70]}]}}),
            json!({"modelMetadata": {"neuralAccuracy": "great"}}),
            json!({"historicalTrends": [{"eventCount": {}}]}),
        ] {
            assert!(
                matches!(
                    normalize(&raw.to_string(), &ctx()),
                    Err(GuardError::MalformedResponse(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_absent_fields_take_defaults() {
        let result = normalize(r#"{"risks":[{"type":"Flood"}]}"#, &ctx()).unwrap();
        assert_eq!(result.overall_risk_level, RiskLevel::Moderate);
        assert_eq!(result.prediction_confidence, 0);
        assert_eq!(result.risks[0].probability, 0);
        assert_eq!(result.risks[0].severity, RiskSeverity::Medium);
    }

    #[test]
    fn test_sources_come_from_context() {
        let mut context = ctx();
        context.sources = vec![GroundingSource {
            title: "USGS".to_string(),
            uri: "https://usgs.gov".to_string(),
        }];
        let result = normalize("{}", &context).unwrap();
        assert_eq!(result.sources, context.sources);
    }
}
