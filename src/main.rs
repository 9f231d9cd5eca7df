//! Glycoscope: diabetes-risk inference service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glycoscope::adapters::sanitize::SanitizingMakeWriter;
use glycoscope::adapters::ModelBundle;
use glycoscope::application::{EnsemblePredictor, PredictionService};
use glycoscope::config::{LogMode, ServiceConfig};
use glycoscope::http::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env()?;

    let (writer, _guard) = match &config.log_mode {
        LogMode::File(path) => {
            if let Some(parent) = path.parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {path:?}"))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(
            SanitizingMakeWriter::new(writer).with_max_bytes(config.sanitize_max_bytes),
        ))
        .init();

    tracing::info!("Starting Glycoscope {}...", env!("CARGO_PKG_VERSION"));

    // Artifacts are loaded exactly once; the server never starts without them.
    let bundle = ModelBundle::load(&config.model_dir, config.require_manifest)
        .with_context(|| format!("Failed to load model artifacts from {:?}", config.model_dir))?;

    let ensemble = EnsemblePredictor::new(
        Box::new(bundle.svm),
        Box::new(bundle.mlp),
        Box::new(bundle.xgb),
    );
    let service = PredictionService::new(Arc::new(bundle.scaler), Arc::new(ensemble));

    http::serve(config.bind, AppState::new(Arc::new(service))).await?;

    tracing::info!("Glycoscope shutdown complete.");
    Ok(())
}
