//! Classifier port: the one capability every sub-model family exposes.
//!
//! The ensemble only sees this trait, so support-vector, neural and
//! tree-ensemble models are interchangeable in any voter slot.

use crate::domain::FeatureVector;

/// Errors raised while evaluating a sub-model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("{model}: expected {expected} features, got {actual}")]
    DimensionMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("{model}: decision value is not finite")]
    NonFinite { model: String },

    #[error("{model}: {reason}")]
    Evaluation { model: String, reason: String },
}

/// A trained binary classifier.
///
/// Implementations are immutable after load and shared across request
/// handlers, hence `Send + Sync`.
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs and the health report.
    fn name(&self) -> &str;

    /// Predict the class integer for one scaled feature vector.
    ///
    /// # Errors
    /// Returns `ModelError` if the model cannot produce a valid decision.
    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError>;
}

impl<T: Classifier + ?Sized> Classifier for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        (**self).predict(features)
    }
}
