pub mod error;
pub mod prediction;
pub mod utils;

pub use error::{ErrorCategory, ErrorClassifier, GuardError, ProviderError, Result};
pub use prediction::{
    DisasterRisk, FutureForecast, FutureHotspot, GroundingSource, HistoricalTrend, Language,
    ModelMetadata, PredictionRequest, PredictionResult, ReportSeverity, RiskLevel, RiskSeverity,
    UserReport,
};
pub use utils::{
    ParseWithDefault, json_f64_field, json_i64_field, json_objects, json_string,
    json_string_array, json_string_or,
};
