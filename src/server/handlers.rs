use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::Serialize;
use tracing::info;

use super::AppState;
use super::error::AppError;
use crate::constants::server::ENGINE_NAME;
use crate::types::{PredictionRequest, PredictionResult};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub engine: &'static str,
    pub language: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        engine: ENGINE_NAME,
        language: "rust",
    })
}

pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::Rejected(rejection.status(), rejection.body_text()))?;

    info!(
        location = %request.location,
        lang = request.lang.code(),
        reports = request.reports.len(),
        "Analyze request"
    );

    let result = state.analyzer.analyze(&request).await?;
    Ok(Json(result))
}
