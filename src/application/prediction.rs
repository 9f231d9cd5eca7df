//! Prediction service: encode → scale → vote.

use std::sync::Arc;

use crate::domain::{FeatureVector, PatientRecord, Verdict};
use crate::ports::FeatureScaler;
use crate::Result;

use super::EnsemblePredictor;

/// Runs one patient record through the loaded artifacts.
///
/// Holds only read-only shared state, so one instance serves every request
/// handler concurrently without locking.
pub struct PredictionService<S>
where
    S: FeatureScaler,
{
    scaler: Arc<S>,
    ensemble: Arc<EnsemblePredictor>,
}

impl<S> PredictionService<S>
where
    S: FeatureScaler,
{
    /// Create a new prediction service.
    pub fn new(scaler: Arc<S>, ensemble: Arc<EnsemblePredictor>) -> Self {
        Self { scaler, ensemble }
    }

    #[must_use]
    pub fn voter_names(&self) -> Vec<String> {
        self.ensemble.voter_names()
    }

    /// Predict the diabetes-risk label for one record.
    ///
    /// # Errors
    /// Returns `GlycoscopeError::Inference` if any sub-model fails.
    pub fn predict(&self, record: &PatientRecord) -> Result<Verdict> {
        let encoded = FeatureVector::encode(record);
        let scaled = self.scaler.transform(&encoded);
        let verdict = self.ensemble.vote(&scaled)?;

        tracing::debug!(
            votes = ?verdict.votes,
            agreement = verdict.agreement(),
            "Ensemble vote complete: {}",
            verdict.label
        );

        Ok(verdict)
    }
}
