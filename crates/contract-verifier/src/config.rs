// crates/contract-verifier/src/config.rs
// ============================================================================
// Module: Verifier Configuration
// Description: Transport limits and environment overrides for the verifier.
// Purpose: Centralize config defaults with strict environment parsing.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`VerifierConfig`] bounds every request (timeout, response size) and can be
//! deserialized from a runner's own config file. Environment overrides are
//! parsed with strict UTF-8 and value validation; invalid values fail closed
//! instead of silently falling back to defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Environment value is not valid UTF-8.
    #[error("{0} must be valid UTF-8")]
    InvalidUtf8(String),
    /// Environment value is set but blank.
    #[error("{0} must not be empty")]
    Empty(String),
    /// Value failed validation.
    #[error("{name} {reason}")]
    InvalidValue {
        /// Setting or variable name.
        name: String,
        /// Validation failure.
        reason: String,
    },
}

// ============================================================================
// SECTION: Environment Keys
// ============================================================================

/// Environment keys read by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierEnv {
    /// Base URL of the mock endpoint.
    MockUrl,
    /// Request timeout override in milliseconds (positive integer).
    TimeoutMs,
    /// Event log destination: `stderr` or a file path.
    EventLog,
}

impl VerifierEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MockUrl => "CONTRACT_VERIFIER_MOCK_URL",
            Self::TimeoutMs => "CONTRACT_VERIFIER_TIMEOUT_MS",
            Self::EventLog => "CONTRACT_VERIFIER_EVENT_LOG",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Transport configuration for the verifier.
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle, including body read.
/// - `max_response_bytes` is a hard upper bound on response bodies.
/// - Redirects are not followed unless `allow_redirects` is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Follow redirects (up to ten hops).
    pub allow_redirects: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_response_bytes: 1024 * 1024,
            user_agent: "contract-verifier/0.1".to_string(),
            allow_redirects: false,
        }
    }
}

impl VerifierConfig {
    /// Validates limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a limit is zero or the user agent is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(invalid("timeout_ms", "must be greater than zero"));
        }
        if self.max_response_bytes == 0 {
            return Err(invalid("max_response_bytes", "must be greater than zero"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        Ok(())
    }

    /// Applies environment overrides on top of this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override is not valid UTF-8, is empty,
    /// or is not a positive integer.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        let name = VerifierEnv::TimeoutMs.as_str();
        if let Some(raw) = read_env_nonempty(name)? {
            self.timeout_ms = parse_positive_u64(name, &raw)?;
        }
        Ok(self)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidUtf8`] when the value contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, ConfigError> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| ConfigError::InvalidUtf8(name.to_string()))
    })
}

/// Reads an environment variable and rejects blank values.
///
/// # Errors
///
/// Returns [`ConfigError`] when the value is invalid UTF-8 or blank.
pub fn read_env_nonempty(name: &str) -> Result<Option<String>, ConfigError> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(name.to_string())),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive integer.
fn parse_positive_u64(name: &str, raw: &str) -> Result<u64, ConfigError> {
    let value: u64 =
        raw.trim().parse().map_err(|_| invalid(name, "must be a positive integer"))?;
    if value == 0 {
        return Err(invalid(name, "must be greater than zero"));
    }
    Ok(value)
}

/// Builds an [`ConfigError::InvalidValue`].
fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
