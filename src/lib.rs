//! # Glycoscope
//!
//! Diabetes-risk inference service.
//!
//! A patient record arrives over HTTP, is encoded into eight numeric
//! features, standardized with a pre-fitted scaler, and classified by a
//! majority vote of three sub-models (support vector machine, multilayer
//! perceptron, gradient-boosted trees).
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientRecord, FeatureVector, PredictionLabel)
//! - `ports`: Trait definitions for the scaler and the sub-models
//! - `adapters`: Concrete model families, artifact loading, log sanitization
//! - `application`: Ensemble and the prediction use case
//! - `http`: axum router exposing `POST /predict`
//! - `config`: environment-driven startup configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;

pub use domain::{FeatureVector, PatientRecord, PredictionLabel};

/// Result type for Glycoscope operations
pub type Result<T> = std::result::Result<T, GlycoscopeError>;

/// Main error type for Glycoscope
#[derive(Debug, thiserror::Error)]
pub enum GlycoscopeError {
    #[error("Artifact loading failed: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ports::ModelError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
