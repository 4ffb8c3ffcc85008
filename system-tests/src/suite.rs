// system-tests/src/suite.rs
// ============================================================================
// Module: Contract Suites
// Description: TOML fixture tables of contract expectations.
// Purpose: Load and validate named expectation suites before any request.
// Dependencies: contract-verifier-core, serde, toml, thiserror
// ============================================================================

//! ## Overview
//! A suite file names a contract and lists its expectations as
//! `[[expectation]]` tables. Every entry is validated while loading, so a
//! malformed expectation fails the whole suite before a mock is contacted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use contract_verifier_core::Expectation;
use contract_verifier_core::ExpectationError;
use contract_verifier_core::ExpectationSpec;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Suite loading errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Suite file could not be read.
    #[error("failed to read suite {path}: {reason}")]
    Read {
        /// Suite file path.
        path: String,
        /// I/O failure.
        reason: String,
    },
    /// Suite file is not a valid suite table.
    #[error("failed to parse suite {origin}: {reason}")]
    Parse {
        /// Suite origin (path or label).
        origin: String,
        /// Parse failure.
        reason: String,
    },
    /// An expectation failed validation.
    #[error("suite {origin} expectation #{index} ({label}): {source}")]
    Invalid {
        /// Suite origin (path or label).
        origin: String,
        /// Zero-based expectation index.
        index: usize,
        /// Expectation name, or its method and path.
        label: String,
        /// Validation failure.
        source: ExpectationError,
    },
    /// Suite declares no expectations.
    #[error("suite {0} declares no expectations")]
    Empty(String),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// On-disk suite layout.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    /// Contract name.
    name: String,
    /// Contract version.
    #[serde(default)]
    version: Option<String>,
    /// Expectation tables.
    #[serde(default, rename = "expectation")]
    expectations: Vec<ExpectationSpec>,
}

/// A validated, ordered set of expectations for one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractSuite {
    /// Contract name.
    name: String,
    /// Contract version.
    version: Option<String>,
    /// Expectations in file order.
    expectations: Vec<Expectation>,
}

impl ContractSuite {
    /// Loads and validates a suite file.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError`] when the file is unreadable, malformed, empty,
    /// or contains an invalid expectation.
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let raw = fs::read_to_string(path).map_err(|err| SuiteError::Read {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_toml_str(&raw, &path.display().to_string())
    }

    /// Parses and validates a suite from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError`] when the text is malformed, empty, or contains
    /// an invalid expectation.
    pub fn from_toml_str(raw: &str, origin: &str) -> Result<Self, SuiteError> {
        let file: SuiteFile = toml::from_str(raw).map_err(|err| SuiteError::Parse {
            origin: origin.to_string(),
            reason: err.to_string(),
        })?;
        if file.expectations.is_empty() {
            return Err(SuiteError::Empty(origin.to_string()));
        }
        let mut expectations = Vec::with_capacity(file.expectations.len());
        for (index, spec) in file.expectations.into_iter().enumerate() {
            let label =
                spec.name.clone().unwrap_or_else(|| format!("{} {}", spec.method, spec.path));
            let expectation =
                Expectation::try_from(spec).map_err(|source| SuiteError::Invalid {
                    origin: origin.to_string(),
                    index,
                    label,
                    source,
                })?;
            expectations.push(expectation);
        }
        Ok(Self {
            name: file.name,
            version: file.version,
            expectations,
        })
    }

    /// Loads the bundled Library API suite.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError`] when the bundled fixture is missing or invalid.
    pub fn library_api() -> Result<Self, SuiteError> {
        Self::load(&fixtures_dir().join("library-api.toml"))
    }

    /// Returns the contract name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the contract version.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the expectations in file order.
    #[must_use]
    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    /// Returns the first expectation with the given name.
    #[must_use]
    pub fn expectation(&self, name: &str) -> Option<&Expectation> {
        self.expectations.iter().find(|expectation| expectation.name() == name)
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Returns the directory holding bundled fixtures.
#[must_use]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}
