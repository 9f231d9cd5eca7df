//! Scaler port: pre-fitted feature standardization.

use crate::domain::FeatureVector;

/// A fitted, deterministic feature transform applied before every model.
pub trait FeatureScaler: Send + Sync {
    fn transform(&self, features: &FeatureVector) -> FeatureVector;
}
