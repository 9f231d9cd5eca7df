//! Prediction output types.

use serde::Serialize;

/// Class integer for the positive (diabetic) outcome.
pub const POSITIVE_CLASS: u8 = 1;

/// Human-readable ensemble outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredictionLabel {
    #[serde(rename = "Diabetic")]
    Diabetic,
    #[serde(rename = "Non-Diabetic")]
    NonDiabetic,
}

impl PredictionLabel {
    /// Map a class integer: 1 is diabetic, anything else is not.
    #[must_use]
    pub fn from_class(class: u8) -> Self {
        if class == POSITIVE_CLASS {
            Self::Diabetic
        } else {
            Self::NonDiabetic
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diabetic => "Diabetic",
            Self::NonDiabetic => "Non-Diabetic",
        }
    }
}

impl std::fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sub-model's vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub model: String,
    pub class: u8,
}

/// Result of one full prediction, before it is reduced to a label on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Majority class
    pub class: u8,

    pub label: PredictionLabel,

    /// Individual votes, in voter order
    pub votes: Vec<Vote>,
}

impl Verdict {
    #[must_use]
    pub fn new(class: u8, votes: Vec<Vote>) -> Self {
        Self {
            class,
            label: PredictionLabel::from_class(class),
            votes,
        }
    }

    /// Number of voters that agreed with the majority.
    #[must_use]
    pub fn agreement(&self) -> usize {
        self.votes.iter().filter(|v| v.class == self.class).count()
    }
}
