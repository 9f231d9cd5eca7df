//! Support vector classifier (inference only).
//!
//! Parameters come from a fitted kernel SVC:
//!
//! - decision: f(x) = Σ(dual_coefᵢ·K(svᵢ, x)) + intercept
//! - class: `classes[1]` if f(x) > 0, otherwise `classes[0]`

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

use super::artifacts::ArtifactError;
use crate::domain::{FeatureVector, FEATURE_COUNT};
use crate::ports::{Classifier, ModelError};

/// Kernel function.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// K(a, b) = a·b
    Linear,
    /// K(a, b) = exp(-γ‖a-b‖²)
    Rbf,
    /// K(a, b) = (γ·a·b + coef0)^degree
    Poly,
    /// K(a, b) = tanh(γ·a·b + coef0)
    Sigmoid,
}

fn default_degree() -> u32 {
    3
}

fn default_classes() -> [u8; 2] {
    [0, 1]
}

/// Exported SVC parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SvmParams {
    pub kernel: Kernel,
    #[serde(default)]
    pub gamma: f64,
    #[serde(default)]
    pub coef0: f64,
    #[serde(default = "default_degree")]
    pub degree: u32,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
    /// Negative and positive class integers
    #[serde(default = "default_classes")]
    pub classes: [u8; 2],
}

/// Margin-based voter.
#[derive(Debug, Clone)]
pub struct SupportVectorClassifier {
    name: String,
    kernel: Kernel,
    gamma: f64,
    coef0: f64,
    degree: i32,
    support_vectors: Array2<f64>,
    dual_coef: Array1<f64>,
    intercept: f64,
    classes: [u8; 2],
}

impl SupportVectorClassifier {
    /// Validate exported parameters.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` on shape mismatches, non-finite
    /// parameters, or a non-positive gamma for non-linear kernels.
    pub fn from_params(name: &str, params: SvmParams) -> Result<Self, ArtifactError> {
        let n_sv = params.support_vectors.len();
        if n_sv == 0 {
            return Err(ArtifactError::invalid(name, "no support vectors"));
        }
        if params.dual_coef.len() != n_sv {
            return Err(ArtifactError::invalid(
                name,
                format!(
                    "dual_coef has {} values for {n_sv} support vectors",
                    params.dual_coef.len()
                ),
            ));
        }
        if let Some(row) = params
            .support_vectors
            .iter()
            .find(|row| row.len() != FEATURE_COUNT)
        {
            return Err(ArtifactError::invalid(
                name,
                format!("support vector has {} features, expected {FEATURE_COUNT}", row.len()),
            ));
        }
        if params.kernel != Kernel::Linear && !(params.gamma > 0.0) {
            return Err(ArtifactError::invalid(
                name,
                format!("gamma must be positive for {:?} kernel", params.kernel),
            ));
        }
        let degree = i32::try_from(params.degree)
            .map_err(|_| ArtifactError::invalid(name, "degree out of range"))?;

        let flat: Vec<f64> = params.support_vectors.into_iter().flatten().collect();
        let all_finite = flat
            .iter()
            .chain(&params.dual_coef)
            .chain([&params.intercept, &params.gamma, &params.coef0])
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ArtifactError::invalid(name, "parameters contain non-finite values"));
        }

        let support_vectors = Array2::from_shape_vec((n_sv, FEATURE_COUNT), flat)
            .map_err(|e| ArtifactError::invalid(name, e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            kernel: params.kernel,
            gamma: params.gamma,
            coef0: params.coef0,
            degree,
            support_vectors,
            dual_coef: Array1::from(params.dual_coef),
            intercept: params.intercept,
            classes: params.classes,
        })
    }

    #[inline]
    fn kernel(&self, sv: ArrayView1<f64>, x: &Array1<f64>) -> f64 {
        match self.kernel {
            Kernel::Linear => sv.dot(x),
            Kernel::Rbf => {
                let sq_dist: f64 = sv.iter().zip(x.iter()).map(|(a, b)| (a - b).powi(2)).sum();
                (-self.gamma * sq_dist).exp()
            }
            Kernel::Poly => (self.gamma * sv.dot(x) + self.coef0).powi(self.degree),
            Kernel::Sigmoid => (self.gamma * sv.dot(x) + self.coef0).tanh(),
        }
    }

    /// Signed distance from the separating surface.
    #[must_use]
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        let x = features.to_array1();
        self.support_vectors
            .rows()
            .into_iter()
            .zip(self.dual_coef.iter())
            .map(|(sv, alpha)| alpha * self.kernel(sv, &x))
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for SupportVectorClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        let f = self.decision_function(features);
        if !f.is_finite() {
            return Err(ModelError::NonFinite {
                model: self.name.clone(),
            });
        }
        Ok(if f > 0.0 { self.classes[1] } else { self.classes[0] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(i: usize, v: f64) -> Vec<f64> {
        let mut row = vec![0.0; FEATURE_COUNT];
        row[i] = v;
        row
    }

    fn params(kernel: Kernel) -> SvmParams {
        SvmParams {
            kernel,
            gamma: 0.5,
            coef0: 0.0,
            degree: 2,
            support_vectors: vec![unit(6, 1.0), unit(6, -1.0)],
            dual_coef: vec![1.0, -1.0],
            intercept: 0.0,
            classes: [0, 1],
        }
    }

    fn x(v: f64) -> FeatureVector {
        FeatureVector::from_slice(&unit(6, v)).expect("8 features")
    }

    #[test]
    fn test_linear_decision() {
        let svm = SupportVectorClassifier::from_params("svm", params(Kernel::Linear)).expect("valid");
        // w = sv0 - sv1 = 2·e6
        assert!((svm.decision_function(&x(1.5)) - 3.0).abs() < 1e-12);
        assert_eq!(svm.predict(&x(1.5)), Ok(1));
        assert_eq!(svm.predict(&x(-0.2)), Ok(0));
    }

    #[test]
    fn test_zero_decision_is_negative_class() {
        let svm = SupportVectorClassifier::from_params("svm", params(Kernel::Linear)).expect("valid");
        assert_eq!(svm.predict(&x(0.0)), Ok(0));
    }

    #[test]
    fn test_rbf_decision() {
        let svm = SupportVectorClassifier::from_params("svm", params(Kernel::Rbf)).expect("valid");
        // exp(-0.5·0) - exp(-0.5·4)
        let expected = 1.0 - (-2.0f64).exp();
        assert!((svm.decision_function(&x(1.0)) - expected).abs() < 1e-12);
        assert_eq!(svm.predict(&x(1.0)), Ok(1));
        assert_eq!(svm.predict(&x(-1.0)), Ok(0));
    }

    #[test]
    fn test_poly_is_symmetric_for_even_degree() {
        let svm = SupportVectorClassifier::from_params("svm", params(Kernel::Poly)).expect("valid");
        // (0.5·v)² - (-0.5·v)² = 0 for any v
        assert!(svm.decision_function(&x(3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_custom_classes() {
        let mut p = params(Kernel::Linear);
        p.classes = [1, 0];
        let svm = SupportVectorClassifier::from_params("svm", p).expect("valid");
        assert_eq!(svm.predict(&x(2.0)), Ok(0));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let mut p = params(Kernel::Linear);
        p.dual_coef.pop();
        assert!(SupportVectorClassifier::from_params("svm", p).is_err());

        let mut p = params(Kernel::Linear);
        p.support_vectors[0].push(0.0);
        assert!(SupportVectorClassifier::from_params("svm", p).is_err());

        let mut p = params(Kernel::Rbf);
        p.gamma = 0.0;
        assert!(SupportVectorClassifier::from_params("svm", p).is_err());
    }

    #[test]
    fn test_overflow_is_model_error() {
        let mut p = params(Kernel::Linear);
        p.dual_coef = vec![f64::MAX, -f64::MAX];
        let svm = SupportVectorClassifier::from_params("svm", p).expect("valid");
        assert!(matches!(
            svm.predict(&x(10.0)),
            Err(ModelError::NonFinite { .. })
        ));
    }
}
