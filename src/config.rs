//! Service configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;
use crate::GlycoscopeError;

pub const BIND_ENV: &str = "GLYCOSCOPE_BIND";
pub const MODEL_DIR_ENV: &str = "GLYCOSCOPE_MODEL_DIR";
pub const REQUIRE_MANIFEST_ENV: &str = "GLYCOSCOPE_REQUIRE_MANIFEST";
pub const LOG_MODE_ENV: &str = "GLYCOSCOPE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "GLYCOSCOPE_LOG_FILE";
pub const SANITIZE_MAX_BYTES_ENV: &str = "GLYCOSCOPE_SANITIZE_MAX_BYTES";

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_LOG_FILE: &str = "glycoscope.log";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File(PathBuf),
}

/// Startup configuration. Read once; there is no reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub model_dir: PathBuf,
    /// Refuse to start without a verified `manifest.json`
    pub require_manifest: bool,
    pub log_mode: LogMode,
    /// Per-line input cap for the log sanitizer
    pub sanitize_max_bytes: usize,
}

/// `1/true/TRUE/yes/YES` are true; anything else, or unset, is false.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

impl ServiceConfig {
    /// Read the process environment.
    ///
    /// # Errors
    /// Returns `GlycoscopeError::Config` for an unparseable bind address or
    /// sanitizer limit.
    pub fn from_env() -> Result<Self, GlycoscopeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production).
    ///
    /// # Errors
    /// Returns `GlycoscopeError::Config` for an unparseable bind address or
    /// sanitizer limit.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GlycoscopeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.trim().parse::<SocketAddr>().map_err(|e| {
            GlycoscopeError::Config(format!("{BIND_ENV}={bind_raw:?} is not a socket address: {e}"))
        })?;

        let model_dir = lookup(MODEL_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));

        let require_manifest = lookup(REQUIRE_MANIFEST_ENV)
            .map(|v| parse_bool(v.trim()))
            .unwrap_or(false);

        let log_mode = match lookup(LOG_MODE_ENV).as_deref().map(str::trim) {
            Some("file") => LogMode::File(
                lookup(LOG_FILE_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            ),
            _ => LogMode::Stdout,
        };

        let sanitize_max_bytes = match lookup(SANITIZE_MAX_BYTES_ENV) {
            None => DEFAULT_SANITIZE_MAX_BYTES,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| {
                    GlycoscopeError::Config(format!(
                        "{SANITIZE_MAX_BYTES_ENV}={raw:?} is not a positive byte count"
                    ))
                })?,
        };

        Ok(Self {
            bind,
            model_dir,
            require_manifest,
            log_mode,
            sanitize_max_bytes,
        })
    }
}
