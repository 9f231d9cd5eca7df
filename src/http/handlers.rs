//! Request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::error::ApiError;
use super::AppState;
use crate::domain::{PatientRecord, PredictionLabel};
use crate::ports::FeatureScaler;

/// `POST /predict` response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub prediction: PredictionLabel,
}

/// `GET /health` response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Voter names in voting order
    pub models: Vec<String>,
}

pub(super) async fn health_handler<S>(State(state): State<AppState<S>>) -> Json<HealthResponse>
where
    S: FeatureScaler + 'static,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        models: state.service.voter_names(),
    })
}

pub(super) async fn predict_handler<S>(
    State(state): State<AppState<S>>,
    payload: Result<Json<PatientRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError>
where
    S: FeatureScaler + 'static,
{
    let Json(record) = payload?;
    let verdict = state.service.predict(&record)?;

    tracing::info!(
        prediction = %verdict.label,
        agreement = verdict.agreement(),
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        prediction: verdict.label,
    }))
}
