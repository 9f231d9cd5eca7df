//! Multilayer perceptron classifier (inference only).
//!
//! Dense layers `h = act(h·W + b)`; weights are stored input-major
//! (`n_in` rows × `n_out` columns). The last layer has a single logistic unit.

use ndarray::{Array1, Array2};
use serde::Deserialize;

use super::artifacts::ArtifactError;
use crate::domain::{FeatureVector, FEATURE_COUNT};
use crate::ports::{Classifier, ModelError};

/// Hidden-layer activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Identity,
    Logistic,
    Tanh,
    Relu,
}

impl Activation {
    #[inline]
    fn apply(self, z: f64) -> f64 {
        match self {
            Self::Identity => z,
            Self::Logistic => logistic(z),
            Self::Tanh => z.tanh(),
            Self::Relu => z.max(0.0),
        }
    }
}

#[inline]
fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// One exported dense layer.
#[derive(Debug, Clone, Deserialize)]
pub struct DenseLayerParams {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

/// Exported network parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct MlpParams {
    pub activation: Activation,
    /// Hidden layers followed by the output layer
    pub layers: Vec<DenseLayerParams>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

/// Neural voter.
#[derive(Debug, Clone)]
pub struct MultilayerPerceptron {
    name: String,
    activation: Activation,
    layers: Vec<DenseLayer>,
}

impl MultilayerPerceptron {
    /// Validate exported parameters and check that layer shapes chain from
    /// [`FEATURE_COUNT`] inputs to one output.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` on any shape or value problem.
    pub fn from_params(name: &str, params: MlpParams) -> Result<Self, ArtifactError> {
        if params.layers.is_empty() {
            return Err(ArtifactError::invalid(name, "network has no layers"));
        }

        let mut layers = Vec::with_capacity(params.layers.len());
        let mut n_in = FEATURE_COUNT;
        for (i, layer) in params.layers.into_iter().enumerate() {
            if layer.weights.len() != n_in {
                return Err(ArtifactError::invalid(
                    name,
                    format!("layer {i} expects {n_in} inputs, has {} weight rows", layer.weights.len()),
                ));
            }
            let n_out = layer.biases.len();
            if n_out == 0 || layer.weights.iter().any(|row| row.len() != n_out) {
                return Err(ArtifactError::invalid(
                    name,
                    format!("layer {i} weight columns do not match {n_out} biases"),
                ));
            }
            let flat: Vec<f64> = layer.weights.into_iter().flatten().collect();
            if flat.iter().chain(&layer.biases).any(|v| !v.is_finite()) {
                return Err(ArtifactError::invalid(
                    name,
                    format!("layer {i} contains non-finite values"),
                ));
            }
            let weights = Array2::from_shape_vec((n_in, n_out), flat)
                .map_err(|e| ArtifactError::invalid(name, e.to_string()))?;
            layers.push(DenseLayer {
                weights,
                biases: Array1::from(layer.biases),
            });
            n_in = n_out;
        }
        if n_in != 1 {
            return Err(ArtifactError::invalid(
                name,
                format!("output layer has {n_in} units, expected 1"),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            activation: params.activation,
            layers,
        })
    }

    /// Probability of the positive class.
    #[must_use]
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let last = self.layers.len() - 1;
        let mut h = features.to_array1();
        for (i, layer) in self.layers.iter().enumerate() {
            let z = h.dot(&layer.weights) + &layer.biases;
            h = if i == last {
                z.mapv(logistic)
            } else {
                z.mapv(|v| self.activation.apply(v))
            };
        }
        h[0]
    }
}

impl Classifier for MultilayerPerceptron {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        let p = self.predict_proba(features);
        if !p.is_finite() {
            return Err(ModelError::NonFinite {
                model: self.name.clone(),
            });
        }
        Ok(u8::from(p > 0.5))
    }
}
