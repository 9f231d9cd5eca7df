//! Majority-vote ensemble over three heterogeneous sub-models.

use std::collections::BTreeMap;

use crate::domain::{FeatureVector, Verdict, Vote};
use crate::ports::{Classifier, ModelError};

/// Statistical mode of `classes`.
///
/// When several classes share the highest count the smallest one wins.
/// Returns `None` for an empty slice.
#[must_use]
pub fn majority_vote(classes: &[u8]) -> Option<u8> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for &class in classes {
        *counts.entry(class).or_default() += 1;
    }

    let mut best: Option<(u8, usize)> = None;
    for (class, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((class, count));
        }
    }
    best.map(|(class, _)| class)
}

/// Ensemble of a margin-based, a neural and a tree-ensemble classifier.
///
/// Every voter sees the same scaled vector. Any voter failure fails the
/// whole prediction: a partial ensemble would silently change the vote.
pub struct EnsemblePredictor {
    voters: [Box<dyn Classifier>; 3],
}

impl EnsemblePredictor {
    #[must_use]
    pub fn new(
        svm: Box<dyn Classifier>,
        nn: Box<dyn Classifier>,
        xgb: Box<dyn Classifier>,
    ) -> Self {
        Self {
            voters: [svm, nn, xgb],
        }
    }

    /// Voter names in voting order.
    #[must_use]
    pub fn voter_names(&self) -> Vec<String> {
        self.voters.iter().map(|v| v.name().to_string()).collect()
    }

    /// Collect every vote and reduce them to the majority class.
    ///
    /// # Errors
    /// Returns the first `ModelError` raised by any voter.
    pub fn vote(&self, features: &FeatureVector) -> Result<Verdict, ModelError> {
        let votes = self
            .voters
            .iter()
            .map(|voter| {
                voter.predict(features).map(|class| Vote {
                    model: voter.name().to_string(),
                    class,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let classes: Vec<u8> = votes.iter().map(|v| v.class).collect();
        // Three voters, so the slice is never empty.
        let class = majority_vote(&classes).unwrap_or_default();
        Ok(Verdict::new(class, votes))
    }

    /// Majority class only.
    ///
    /// # Errors
    /// Returns the first `ModelError` raised by any voter.
    pub fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        self.vote(features).map(|v| v.class)
    }
}

impl std::fmt::Debug for EnsemblePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsemblePredictor")
            .field("voters", &self.voter_names())
            .finish()
    }
}
