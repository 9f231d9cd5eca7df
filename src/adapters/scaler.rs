//! Standard scaler adapter: per-feature `(x - mean) / scale`.

use serde::Deserialize;

use super::artifacts::ArtifactError;
use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::FeatureScaler;

/// Fitted scaler parameters as exported by the training pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    /// Must equal [`FEATURE_NAMES`] in order.
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Pre-fitted standardization over the eight model inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Validate exported parameters.
    ///
    /// A zero scale (constant feature at fit time) is replaced by 1.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the feature order differs from
    /// [`FEATURE_NAMES`], lengths are wrong, or any value is not finite.
    pub fn from_params(name: &str, params: ScalerParams) -> Result<Self, ArtifactError> {
        if params.feature_names.len() != FEATURE_COUNT
            || params
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .any(|(got, want)| got != want)
        {
            return Err(ArtifactError::invalid(
                name,
                format!(
                    "feature_names {:?} do not match the model input order {:?}",
                    params.feature_names, FEATURE_NAMES
                ),
            ));
        }

        let mean = to_array(name, "mean", &params.mean)?;
        let mut scale = to_array(name, "scale", &params.scale)?;
        for s in &mut scale {
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    #[must_use]
    pub fn scale(&self) -> &[f64; FEATURE_COUNT] {
        &self.scale
    }
}

fn to_array(name: &str, field: &str, values: &[f64]) -> Result<[f64; FEATURE_COUNT], ArtifactError> {
    let arr = <[f64; FEATURE_COUNT]>::try_from(values).map_err(|_| {
        ArtifactError::invalid(
            name,
            format!("{field} has {} values, expected {FEATURE_COUNT}", values.len()),
        )
    })?;
    if arr.iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::invalid(name, format!("{field} contains non-finite values")));
    }
    Ok(arr)
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = *features.as_array();
        for ((x, mean), scale) in out.iter_mut().zip(&self.mean).zip(&self.scale) {
            *x = (*x - mean) / scale;
        }
        FeatureVector::new(out)
    }
}
