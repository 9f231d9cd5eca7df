//! Artifact loading: the fitted scaler and the three sub-models.
//!
//! All artifacts are JSON files in one model directory:
//!
//! - `scaler.json` - standard scaler parameters
//! - `svm.json` - support vector classifier
//! - `mlp.json` - multilayer perceptron
//! - `xgb.json` - XGBoost tree dump
//! - `manifest.json` - optional SHA-256 digests of the files above
//!
//! Loading happens once at startup. Any failure is fatal for the process.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::boosted_trees::{BoosterParams, GradientBoostedTrees};
use super::mlp::{MlpParams, MultilayerPerceptron};
use super::scaler::{ScalerParams, StandardScaler};
use super::svm::{SupportVectorClassifier, SvmParams};

pub const SCALER_FILE: &str = "scaler.json";
pub const SVM_FILE: &str = "svm.json";
pub const MLP_FILE: &str = "mlp.json";
pub const XGB_FILE: &str = "xgb.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Files every model directory must provide.
pub const REQUIRED_ARTIFACTS: [&str; 4] = [SCALER_FILE, SVM_FILE, MLP_FILE, XGB_FILE];

const MANIFEST_VERSION: u32 = 1;

/// Errors raised while loading artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("Manifest required but not found at {0:?}")]
    ManifestMissing(PathBuf),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("File hash mismatch for {0}")]
    HashMismatch(String),
}

impl ArtifactError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Digest list written by `hash_artifacts` and checked at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub created_at: Option<i64>,
    /// File name → lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Hash the required artifacts of `model_dir`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if any required file cannot be read.
    pub fn build(model_dir: &Path, created_at: i64) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in REQUIRED_ARTIFACTS {
            let bytes = read_bytes(&model_dir.join(name))?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: Some(created_at),
            files,
        })
    }
}

/// Everything the service needs, loaded and validated.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub scaler: StandardScaler,
    pub svm: SupportVectorClassifier,
    pub mlp: MultilayerPerceptron,
    pub xgb: GradientBoostedTrees,
    /// Present when the directory carried a verified manifest
    pub manifest: Option<ArtifactManifest>,
}

impl ModelBundle {
    /// Load every artifact from `model_dir`.
    ///
    /// With `require_manifest`, a missing `manifest.json` is an error;
    /// otherwise it only produces a warning. A manifest that is present is
    /// always verified.
    ///
    /// # Errors
    /// Returns `ArtifactError` if any artifact is missing, malformed or fails
    /// verification.
    pub fn load(model_dir: &Path, require_manifest: bool) -> Result<Self, ArtifactError> {
        let manifest = verify_manifest(model_dir, require_manifest)?;

        let scaler = StandardScaler::from_params(
            SCALER_FILE,
            read_json::<ScalerParams>(model_dir, SCALER_FILE)?,
        )?;
        let svm = SupportVectorClassifier::from_params(
            "svm",
            read_json::<SvmParams>(model_dir, SVM_FILE)?,
        )?;
        let mlp = MultilayerPerceptron::from_params(
            "mlp",
            read_json::<MlpParams>(model_dir, MLP_FILE)?,
        )?;
        let xgb = GradientBoostedTrees::from_params(
            "xgb",
            read_json::<BoosterParams>(model_dir, XGB_FILE)?,
        )?;

        tracing::info!(
            "Loaded model bundle from {:?} (xgb trees={}, manifest={})",
            model_dir,
            xgb.num_trees(),
            if manifest.is_some() { "verified" } else { "absent" }
        );

        Ok(Self {
            scaler,
            svm,
            mlp,
            xgb,
            manifest,
        })
    }
}

/// Lowercase hex SHA-256.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(model_dir: &Path, name: &str) -> Result<T, ArtifactError> {
    let bytes = read_bytes(&model_dir.join(name))?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        name: name.to_string(),
        source,
    })
}

/// Only plain file names inside the model directory may be listed.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn verify_manifest(
    model_dir: &Path,
    require_manifest: bool,
) -> Result<Option<ArtifactManifest>, ArtifactError> {
    let manifest_path = model_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        if require_manifest {
            tracing::error!("Artifact manifest not found at {:?}", manifest_path);
            return Err(ArtifactError::ManifestMissing(manifest_path));
        }
        tracing::warn!(
            "Loading artifacts WITHOUT a manifest; integrity of {:?} is not verified",
            model_dir
        );
        return Ok(None);
    }

    let manifest: ArtifactManifest = read_json(model_dir, MANIFEST_FILE)?;
    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Manifest(format!(
            "unsupported version {}",
            manifest.version
        )));
    }
    if let Some(missing) = REQUIRED_ARTIFACTS
        .iter()
        .find(|name| !manifest.files.contains_key(**name))
    {
        return Err(ArtifactError::Manifest(format!("{missing} is not listed")));
    }

    for (name, expected_hex) in &manifest.files {
        if !is_plain_file_name(name) {
            return Err(ArtifactError::Manifest(format!(
                "{name:?} is not a plain file name"
            )));
        }
        let actual_hex = sha256_hex(&read_bytes(&model_dir.join(name))?);
        if !constant_time_eq_str(&actual_hex, &expected_hex.to_ascii_lowercase()) {
            return Err(ArtifactError::HashMismatch(name.clone()));
        }
    }

    Ok(Some(manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureVector;
    use crate::ports::{Classifier, FeatureScaler};

    const MODELS_DIR: &str = "models";

    fn copy_bundle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in REQUIRED_ARTIFACTS {
            fs::copy(Path::new(MODELS_DIR).join(name), dir.path().join(name)).expect("copy");
        }
        dir
    }

    fn write_manifest(dir: &Path) -> ArtifactManifest {
        let manifest = ArtifactManifest::build(dir, 1_700_000_000).expect("build manifest");
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest).expect("serialize"),
        )
        .expect("write manifest");
        manifest
    }

    #[test]
    fn test_load_shipped_bundle() {
        let bundle = ModelBundle::load(Path::new(MODELS_DIR), true).expect("Should load");
        assert!(bundle.manifest.is_some());
        assert_eq!(bundle.svm.name(), "svm");
        assert_eq!(bundle.mlp.name(), "mlp");
        assert_eq!(bundle.xgb.name(), "xgb");
    }

    #[test]
    fn test_shipped_bundle_separates_risk_profiles() {
        let bundle = ModelBundle::load(Path::new(MODELS_DIR), false).expect("Should load");
        // Male, 45, no conditions, never smoked, bmi 25, HbA1c 5.5, glucose 100
        let low = FeatureVector::new([1.0, 45.0, 0.0, 0.0, 0.0, 25.0, 5.5, 100.0]);
        // Female, 67, hypertension, heart disease, former smoker, bmi 34, HbA1c 8.2, glucose 240
        let high = FeatureVector::new([0.0, 67.0, 1.0, 1.0, 2.0, 34.0, 8.2, 240.0]);

        let voters: [&dyn Classifier; 3] = [&bundle.svm, &bundle.mlp, &bundle.xgb];
        for voter in voters {
            let low_scaled = bundle.scaler.transform(&low);
            let high_scaled = bundle.scaler.transform(&high);
            assert_eq!(voter.predict(&low_scaled), Ok(0), "{}", voter.name());
            assert_eq!(voter.predict(&high_scaled), Ok(1), "{}", voter.name());
        }
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = copy_bundle();
        let written = write_manifest(dir.path());
        let bundle = ModelBundle::load(dir.path(), true).expect("Should load");
        assert_eq!(bundle.manifest, Some(written));
    }

    #[test]
    fn test_missing_manifest() {
        let dir = copy_bundle();
        assert!(ModelBundle::load(dir.path(), false).is_ok());
        assert!(matches!(
            ModelBundle::load(dir.path(), true),
            Err(ArtifactError::ManifestMissing(_))
        ));
    }

    #[test]
    fn test_tampered_artifact() {
        let dir = copy_bundle();
        write_manifest(dir.path());
        let path = dir.path().join(SVM_FILE);
        let mut content = fs::read_to_string(&path).expect("read");
        content.push('\n');
        fs::write(&path, content).expect("write");

        match ModelBundle::load(dir.path(), false) {
            Err(ArtifactError::HashMismatch(name)) => assert_eq!(name, SVM_FILE),
            other => panic!("expected hash mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_manifest_must_list_required_files() {
        let dir = copy_bundle();
        let mut manifest = ArtifactManifest::build(dir.path(), 0).expect("build");
        manifest.files.remove(XGB_FILE);
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).expect("serialize"),
        )
        .expect("write");
        let err = ModelBundle::load(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains(XGB_FILE));
    }

    #[test]
    fn test_manifest_rejects_path_traversal() {
        let dir = copy_bundle();
        let mut manifest = ArtifactManifest::build(dir.path(), 0).expect("build");
        manifest
            .files
            .insert("../etc/passwd".to_string(), "00".to_string());
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).expect("serialize"),
        )
        .expect("write");
        assert!(matches!(
            ModelBundle::load(dir.path(), false),
            Err(ArtifactError::Manifest(_))
        ));
    }

    #[test]
    fn test_missing_artifact_is_io_error() {
        let dir = copy_bundle();
        fs::remove_file(dir.path().join(MLP_FILE)).expect("remove");
        assert!(matches!(
            ModelBundle::load(dir.path(), false),
            Err(ArtifactError::Io { .. })
        ));
    }

    #[test]
    fn test_corrupt_artifact_is_parse_error() {
        let dir = copy_bundle();
        fs::write(dir.path().join(SCALER_FILE), b"{not json").expect("write");
        assert!(matches!(
            ModelBundle::load(dir.path(), false),
            Err(ArtifactError::Parse { .. })
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq_str("abc", "abc"));
        assert!(!constant_time_eq_str("abc", "abd"));
        assert!(!constant_time_eq_str("abc", "abcd"));
    }
}
