// crates/contract-verifier/src/resolver.rs
// ============================================================================
// Module: Mock Endpoint Resolution
// Description: Sources for the base URL of the mock service under contract.
// Purpose: Decouple the verifier from how a mock endpoint is provisioned.
// Dependencies: url, thiserror
// ============================================================================

//! ## Overview
//! A [`MockEndpointResolver`] yields the base URL that expectation paths are
//! appended to. The verifier does not care whether that URL belongs to a
//! container, a remote stub, or an in-process fake.
//! Invariants:
//! - Resolved URLs use the `http` or `https` scheme.
//! - Resolved URLs carry no query string or fragment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use url::Url;

use crate::config::ConfigError;
use crate::config::VerifierEnv;
use crate::config::read_env_nonempty;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Endpoint resolution errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No endpoint is configured.
    #[error("mock endpoint not configured: {0}")]
    NotConfigured(String),
    /// Endpoint is not a usable base URL.
    #[error("invalid mock endpoint url: {0}")]
    InvalidUrl(String),
    /// Endpoint configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Endpoint provider failed (container start, upload, and so on).
    #[error("mock endpoint provider failed: {0}")]
    Provider(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Provides the base URL of a mock endpoint.
pub trait MockEndpointResolver {
    /// Resolves the mock endpoint base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when no usable endpoint is available.
    fn resolve(&self) -> Result<Url, ResolveError>;
}

// ============================================================================
// SECTION: Built-in Resolvers
// ============================================================================

/// Resolver for an endpoint known up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEndpoint {
    /// Validated base URL.
    url: Url,
}

impl StaticEndpoint {
    /// Parses and validates a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidUrl`] when the URL cannot be used as a base.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        Ok(Self {
            url: parse_base_url(raw)?,
        })
    }
}

impl MockEndpointResolver for StaticEndpoint {
    fn resolve(&self) -> Result<Url, ResolveError> {
        Ok(self.url.clone())
    }
}

/// Resolver reading the base URL from an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEndpoint {
    /// Environment variable name.
    var: String,
}

impl EnvEndpoint {
    /// Reads the given environment variable.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
        }
    }
}

impl Default for EnvEndpoint {
    fn default() -> Self {
        Self::new(VerifierEnv::MockUrl.as_str())
    }
}

impl MockEndpointResolver for EnvEndpoint {
    fn resolve(&self) -> Result<Url, ResolveError> {
        let raw = read_env_nonempty(&self.var)?
            .ok_or_else(|| ResolveError::NotConfigured(format!("{} is not set", self.var)))?;
        parse_base_url(&raw)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a base URL and enforces scheme and shape rules.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidUrl`] when the URL is unparsable, not
/// http(s), or carries a query or fragment.
pub fn parse_base_url(raw: &str) -> Result<Url, ResolveError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ResolveError::InvalidUrl(format!("{raw}: {err}")))?;
    validate_base_url(&url)?;
    Ok(url)
}

/// Validates an already-parsed base URL.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidUrl`] when the URL cannot be used as a base.
pub fn validate_base_url(url: &Url) -> Result<(), ResolveError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ResolveError::InvalidUrl(format!("unsupported scheme: {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(ResolveError::InvalidUrl(format!("missing host: {url}")));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ResolveError::InvalidUrl(format!("query or fragment not allowed: {url}")));
    }
    Ok(())
}
