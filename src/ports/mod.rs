//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the prediction use case and the loaded model artifacts.

mod classifier;
mod scaler;

pub use classifier::{Classifier, ModelError};
pub use scaler::FeatureScaler;
