// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: contract-verifier
// ============================================================================

//! ## Overview
//! Environment values are parsed with the verifier's strict readers: invalid
//! UTF-8 and blank values fail closed instead of falling back to defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use contract_verifier::ConfigError;
use contract_verifier::config::read_env_nonempty;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Container image used when no override is set.
pub const DEFAULT_MICROCKS_IMAGE: &str = "quay.io/microcks/microcks-uber:latest";

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional artifact root override.
    RunRoot,
    /// Base URL of an already-running Microcks instance.
    MicrocksUrl,
    /// Microcks container image (`name:tag`).
    MicrocksImage,
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunRoot => "CONTRACT_VERIFIER_SYSTEM_RUN_ROOT",
            Self::MicrocksUrl => "CONTRACT_VERIFIER_SYSTEM_MICROCKS_URL",
            Self::MicrocksImage => "CONTRACT_VERIFIER_SYSTEM_MICROCKS_IMAGE",
            Self::TimeoutSeconds => "CONTRACT_VERIFIER_SYSTEM_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTestConfig {
    /// Optional artifact root override.
    pub run_root: Option<PathBuf>,
    /// External Microcks base URL; skips the container when set.
    pub microcks_url: Option<String>,
    /// Microcks image name.
    pub microcks_image: String,
    /// Microcks image tag.
    pub microcks_tag: String,
    /// Optional timeout override.
    pub timeout: Option<Duration>,
}

impl Default for SystemTestConfig {
    fn default() -> Self {
        let (image, tag) = split_image(DEFAULT_MICROCKS_IMAGE);
        Self {
            run_root: None,
            microcks_url: None,
            microcks_image: image,
            microcks_tag: tag,
            timeout: None,
        }
    }
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an environment value is not valid UTF-8,
    /// is empty, or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let run_root = read_env_nonempty(SystemTestEnv::RunRoot.as_str())?.map(PathBuf::from);
        let microcks_url = read_env_nonempty(SystemTestEnv::MicrocksUrl.as_str())?
            .map(|value| value.trim().to_string());
        let (microcks_image, microcks_tag) =
            match read_env_nonempty(SystemTestEnv::MicrocksImage.as_str())? {
                Some(value) => split_image(value.trim()),
                None => (defaults.microcks_image, defaults.microcks_tag),
            };
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            run_root,
            microcks_url,
            microcks_image,
            microcks_tag,
            timeout,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Splits `registry/name:tag` into name and tag; the tag defaults to `latest`.
fn split_image(raw: &str) -> (String, String) {
    let name_start = raw.rfind('/').map_or(0, |index| index + 1);
    match raw[name_start ..].rfind(':') {
        Some(offset) => {
            let split = name_start + offset;
            (raw[.. split].to_string(), raw[split + 1 ..].to_string())
        }
        None => (raw.to_string(), "latest".to_string()),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: "must be a positive integer number of seconds".to_string(),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
