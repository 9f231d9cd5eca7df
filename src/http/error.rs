//! HTTP error mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::GlycoscopeError;

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Request-level failures.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The body did not match the patient record schema. Raised before any
    /// model code runs.
    ///
    /// `detail` echoes the offending value back to the client and is never
    /// logged; only `kind` is.
    #[error("{detail}")]
    Schema { kind: &'static str, detail: String },

    /// A sub-model failed for this request.
    #[error("{0}")]
    Inference(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Schema { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn rejection_kind(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "data",
        JsonRejection::JsonSyntaxError(_) => "syntax",
        JsonRejection::MissingJsonContentType(_) => "content_type",
        JsonRejection::BytesRejection(_) => "body",
        _ => "other",
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Schema {
            kind: rejection_kind(&rejection),
            detail: rejection.body_text(),
        }
    }
}

// Once artifacts are loaded, the only error a prediction can raise is a
// sub-model failure; every variant still answers 500.
impl From<GlycoscopeError> for ApiError {
    fn from(err: GlycoscopeError) -> Self {
        Self::Inference(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Schema { kind, .. } => {
                tracing::warn!(kind = *kind, status = status.as_u16(), "Rejected request body");
            }
            Self::Inference(detail) => {
                tracing::error!("Inference failed: {detail}");
            }
        }
        let detail = self.to_string();
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
