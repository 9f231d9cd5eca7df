//! Application layer: Use cases and services.
//!
//! Orchestrates domain logic with ports to implement the prediction use case.

mod ensemble;
mod prediction;

pub use ensemble::{majority_vote, EnsemblePredictor};
pub use prediction::PredictionService;

#[cfg(test)]
pub(crate) use ensemble::tests as test_support;
