//! Model input vector and the categorical encoder that builds it.

use super::patient::PatientRecord;

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 8;

/// Canonical feature names, in model input order.
///
/// Every artifact is fitted on this exact order. The scaler artifact repeats
/// the list and loading fails on any mismatch.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "age",
    "hypertension",
    "heart_disease",
    "smoking_history",
    "bmi",
    "HbA1c_level",
    "blood_glucose_level",
];

/// One model input, positioned by its discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Gender = 0,
    Age = 1,
    Hypertension = 2,
    HeartDisease = 3,
    SmokingHistory = 4,
    Bmi = 5,
    HbA1c = 6,
    BloodGlucose = 7,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Self::Gender,
        Self::Age,
        Self::Hypertension,
        Self::HeartDisease,
        Self::SmokingHistory,
        Self::Bmi,
        Self::HbA1c,
        Self::BloodGlucose,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    /// Look up a feature by canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::ALL[i])
    }
}

/// Fixed-order numeric input for the scaler and the sub-models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Build a vector from a slice.
    ///
    /// # Errors
    /// Returns the slice length if it is not [`FEATURE_COUNT`].
    pub fn from_slice(values: &[f64]) -> Result<Self, usize> {
        <[f64; FEATURE_COUNT]>::try_from(values)
            .map(Self)
            .map_err(|_| values.len())
    }

    /// Encode a patient record.
    ///
    /// Never fails: unknown categorical labels take their fallback codes and
    /// numeric fields pass through unchanged.
    #[must_use]
    pub fn encode(record: &PatientRecord) -> Self {
        Self([
            f64::from(record.gender().code()),
            record.age,
            record.hypertension as f64,
            record.heart_disease as f64,
            f64::from(record.smoking_history().code()),
            record.bmi,
            record.hba1c_level,
            record.blood_glucose_level,
        ])
    }

    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Copy into an `ndarray` vector for the linear-algebra based models.
    #[must_use]
    pub fn to_array1(&self) -> ndarray::Array1<f64> {
        ndarray::Array1::from(self.0.to_vec())
    }
}
