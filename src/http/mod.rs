//! HTTP API for diabetes-risk prediction.
//!
//! ## Endpoints
//!
//! - `POST /predict` - Predict from one patient record
//! - `GET /health` - Health check
//!
//! CORS is fully open (any origin, method and header).
//!
//! ## Example
//!
//! ```rust,ignore
//! let state = AppState::new(Arc::new(service));
//! glycoscope::http::serve(config.bind, state).await?;
//! ```

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::PredictionService;
use crate::ports::FeatureScaler;

pub use error::{ApiError, ErrorResponse};
pub use handlers::{HealthResponse, PredictResponse};

/// Application state shared across handlers. Read-only after startup.
pub struct AppState<S>
where
    S: FeatureScaler,
{
    service: Arc<PredictionService<S>>,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl<S> AppState<S>
where
    S: FeatureScaler,
{
    #[must_use]
    pub fn new(service: Arc<PredictionService<S>>) -> Self {
        Self {
            service,
            started_at: chrono::Utc::now(),
        }
    }
}

impl<S> Clone for AppState<S>
where
    S: FeatureScaler,
{
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            started_at: self.started_at,
        }
    }
}

/// Create the API router.
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: FeatureScaler + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(handlers::predict_handler::<S>))
        .route("/health", get(handlers::health_handler::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C or SIGTERM.
///
/// # Errors
/// Returns `GlycoscopeError::Io` if binding or serving fails.
pub async fn serve<S>(addr: SocketAddr, state: AppState<S>) -> crate::Result<()>
where
    S: FeatureScaler + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::adapters::{ModelBundle, StandardScaler};
    use crate::application::test_support::{ensemble_of, FailingVoter, FixedVoter};
    use crate::application::EnsemblePredictor;
    use crate::domain::FeatureVector;

    const SCENARIO: &str = r#"{"gender":"Male","age":45,"hypertension":0,"heart_disease":0,"smoking_history":"never","bmi":25.0,"HbA1c_level":5.5,"blood_glucose_level":100}"#;

    #[derive(Default)]
    struct RecordingScaler {
        seen: Mutex<Vec<FeatureVector>>,
    }

    impl FeatureScaler for RecordingScaler {
        fn transform(&self, features: &FeatureVector) -> FeatureVector {
            self.seen.lock().expect("lock").push(*features);
            *features
        }
    }

    fn app_with(ensemble: EnsemblePredictor) -> Router {
        app_with_scaler(Arc::new(RecordingScaler::default()), ensemble)
    }

    fn app_with_scaler<S: FeatureScaler + 'static>(scaler: Arc<S>, ensemble: EnsemblePredictor) -> Router {
        let service = PredictionService::new(scaler, Arc::new(ensemble));
        create_router(AppState::new(Arc::new(service)))
    }

    fn predict_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_scenario_unanimous_negative() {
        let (status, body) = send(app_with(ensemble_of(0, 0, 0)), predict_request(SCENARIO)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"prediction": "Non-Diabetic"}));
    }

    #[tokio::test]
    async fn test_scenario_two_of_three_positive() {
        let (status, body) = send(app_with(ensemble_of(1, 1, 0)), predict_request(SCENARIO)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"prediction": "Diabetic"}));
    }

    #[tokio::test]
    async fn test_scenario_unknown_gender() {
        let scaler = Arc::new(RecordingScaler::default());
        let app = app_with_scaler(Arc::clone(&scaler), ensemble_of(0, 1, 0));
        let body = SCENARIO.replace(r#""gender":"Male""#, r#""gender":"Unknown""#);

        let (status, json) = send(app, predict_request(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"prediction": "Non-Diabetic"}));

        let seen = scaler.seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert!((seen[0].as_slice()[0] - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_malformed_age_never_reaches_models() {
        let (svm, svm_calls) = FixedVoter::counted("svm", 1);
        let (mlp, mlp_calls) = FixedVoter::counted("mlp", 1);
        let (xgb, xgb_calls) = FixedVoter::counted("xgb", 1);
        let app = app_with(EnsemblePredictor::new(svm, mlp, xgb));
        let body = SCENARIO.replace(r#""age":45"#, r#""age":"forty""#);

        let (status, json) = send(app, predict_request(&body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].as_str().is_some_and(|d| d.contains("age")));
        for calls in [svm_calls, mlp_calls, xgb_calls] {
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_missing_field_is_client_error() {
        let body = SCENARIO.replace(r#","bmi":25.0"#, "");
        let (status, json) = send(app_with(ensemble_of(0, 0, 0)), predict_request(&body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["detail"].as_str().is_some_and(|d| d.contains("bmi")));
    }

    #[tokio::test]
    async fn test_syntax_error_is_client_error() {
        let (status, _) =
            send(app_with(ensemble_of(0, 0, 0)), predict_request(r#"{"gender": "Male","#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_client_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .body(Body::from(SCENARIO))
            .expect("request");
        let (status, _) = send(app_with(ensemble_of(0, 0, 0)), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_voter_failure_is_server_error() {
        let ensemble = EnsemblePredictor::new(
            FixedVoter::boxed("svm", 1),
            FixedVoter::boxed("mlp", 1),
            Box::new(FailingVoter),
        );
        let (status, json) = send(app_with(ensemble), predict_request(SCENARIO)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().is_some_and(|d| d.contains("broken")));
    }

    #[tokio::test]
    async fn test_identical_requests_identical_predictions() {
        let app = app_with(ensemble_of(1, 0, 1));
        let (_, first) = send(app.clone(), predict_request(SCENARIO)).await;
        let (_, second) = send(app, predict_request(SCENARIO)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request");
        let (status, json) = send(app_with(ensemble_of(0, 0, 0)), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["models"], serde_json::json!(["svm", "mlp", "xgb"]));
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/predict")
            .header(header::ORIGIN, "https://clinic.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .expect("request");
        let response = app_with(ensemble_of(0, 0, 0))
            .oneshot(request)
            .await
            .expect("response");
        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_shipped_models_end_to_end() {
        let bundle = ModelBundle::load(Path::new("models"), false).expect("Should load models");
        let ensemble = EnsemblePredictor::new(
            Box::new(bundle.svm),
            Box::new(bundle.mlp),
            Box::new(bundle.xgb),
        );
        let scaler: Arc<StandardScaler> = Arc::new(bundle.scaler);
        let app = app_with_scaler(scaler, ensemble);

        let (status, json) = send(app.clone(), predict_request(SCENARIO)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"prediction": "Non-Diabetic"}));

        let high_risk = r#"{"gender":"Female","age":67,"hypertension":1,"heart_disease":1,"smoking_history":"former","bmi":34.0,"HbA1c_level":8.2,"blood_glucose_level":240}"#;
        let (status, json) = send(app, predict_request(high_risk)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"prediction": "Diabetic"}));
    }
}
