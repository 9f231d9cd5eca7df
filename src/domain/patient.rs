//! Patient record accepted by the prediction endpoint.
//!
//! Field names follow the diabetes-prediction dataset the models were
//! trained on, including the mixed-case `HbA1c_level`.

use serde::Deserialize;

/// Recorded gender of the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    /// Parse a request label. Unrecognized labels fall back to [`Gender::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "Male" => Self::Male,
            "Female" => Self::Female,
            _ => Self::Other,
        }
    }

    /// Integer code fed to the models.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
            Self::Other => 2,
        }
    }
}

/// Self-reported smoking history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmokingHistory {
    Never,
    Current,
    Former,
    Ever,
    NotCurrent,
}

impl SmokingHistory {
    /// Parse a request label. Unrecognized labels (including the dataset's
    /// "No Info") fall back to [`SmokingHistory::Never`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "current" => Self::Current,
            "former" => Self::Former,
            "ever" => Self::Ever,
            "not current" => Self::NotCurrent,
            _ => Self::Never,
        }
    }

    /// Integer code fed to the models.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Never => 0,
            Self::Current => 1,
            Self::Former => 2,
            Self::Ever => 3,
            Self::NotCurrent => 4,
        }
    }
}

/// One patient's clinical features as received over the wire.
///
/// Categorical fields stay as raw strings here; the encoder owns the
/// fallback policy for unknown labels. Numeric fields go through
/// [`lenient`] coercion.
#[derive(Clone, PartialEq, Deserialize)]
pub struct PatientRecord {
    pub gender: String,

    #[serde(deserialize_with = "lenient::real")]
    pub age: f64,

    /// 0 = no, 1 = yes
    #[serde(deserialize_with = "lenient::integer")]
    pub hypertension: i64,

    /// 0 = no, 1 = yes
    #[serde(deserialize_with = "lenient::integer")]
    pub heart_disease: i64,

    pub smoking_history: String,

    #[serde(deserialize_with = "lenient::real")]
    pub bmi: f64,

    /// Glycated haemoglobin in %
    #[serde(rename = "HbA1c_level", deserialize_with = "lenient::real")]
    pub hba1c_level: f64,

    /// Blood glucose in mg/dL
    #[serde(deserialize_with = "lenient::real")]
    pub blood_glucose_level: f64,
}

impl PatientRecord {
    #[must_use]
    pub fn gender(&self) -> Gender {
        Gender::from_label(&self.gender)
    }

    #[must_use]
    pub fn smoking_history(&self) -> SmokingHistory {
        SmokingHistory::from_label(&self.smoking_history)
    }
}

// Clinical values must never reach log output through `{:?}`.
impl std::fmt::Debug for PatientRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientRecord")
            .field("gender", &"[REDACTED]")
            .field("age", &"[REDACTED]")
            .field("hypertension", &"[REDACTED]")
            .field("heart_disease", &"[REDACTED]")
            .field("smoking_history", &"[REDACTED]")
            .field("bmi", &"[REDACTED]")
            .field("HbA1c_level", &"[REDACTED]")
            .field("blood_glucose_level", &"[REDACTED]")
            .finish()
    }
}

/// Type coercion for numeric request fields.
///
/// Numbers and numeric strings are accepted; integer fields additionally take
/// integral floats and booleans. Everything else is a schema error.
pub mod lenient {
    use std::fmt;

    use serde::de::{self, Deserializer, Unexpected, Visitor};

    pub fn real<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RealVisitor)
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(IntegerVisitor)
    }

    struct RealVisitor;

    impl<'de> Visitor<'de> for RealVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    struct IntegerVisitor;

    impl<'de> Visitor<'de> for IntegerVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<i64, E> {
            Ok(i64::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim()
                .parse::<i64>()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }
}
