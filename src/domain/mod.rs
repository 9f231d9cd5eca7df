//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. Everything here is deterministic.

mod features;
mod patient;
mod prediction;

pub use features::{Feature, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use patient::{lenient, Gender, PatientRecord, SmokingHistory};
pub use prediction::{PredictionLabel, Verdict, Vote, POSITIVE_CLASS};
