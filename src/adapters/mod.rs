//! Adapters layer: Concrete implementations of ports.
//!
//! - `scaler`: standard scaler (`FeatureScaler`)
//! - `svm`, `mlp`, `boosted_trees`: the three sub-model families (`Classifier`)
//! - `artifacts`: loading and integrity checks for all of the above
//! - `sanitize`: log redaction

pub mod artifacts;
pub mod boosted_trees;
pub mod mlp;
pub mod sanitize;
pub mod scaler;
pub mod svm;

pub use artifacts::{ArtifactError, ArtifactManifest, ModelBundle};
pub use boosted_trees::GradientBoostedTrees;
pub use mlp::MultilayerPerceptron;
pub use scaler::StandardScaler;
pub use svm::SupportVectorClassifier;
