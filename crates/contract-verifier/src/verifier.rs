// crates/contract-verifier/src/verifier.rs
// ============================================================================
// Module: Contract Verifier
// Description: Executes expectations against a mock endpoint.
// Purpose: Turn each expectation into exactly one immutable outcome.
// Dependencies: contract-verifier-core, serde_json, url
// ============================================================================

//! ## Overview
//! [`ContractVerifier`] issues one HTTP request per [`Expectation`] against
//! a base URL, times the exchange, and evaluates the response into an
//! [`Outcome`]. Runs are sequential and never short-circuit: a failed
//! expectation is recorded and the next one executes.
//! Invariants:
//! - `execute_all` returns one outcome per expectation, in input order.
//! - Transport errors become failed outcomes; they are never returned as
//!   errors or panics.
//! - No retries: each execution is a single observation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use contract_verifier_core::Expectation;
use contract_verifier_core::Observation;
use contract_verifier_core::Outcome;
use contract_verifier_core::ResponseBody;
use thiserror::Error;
use url::Url;

use crate::config::ConfigError;
use crate::config::VerifierConfig;
use crate::events::NoopSink;
use crate::events::OutcomeEvent;
use crate::events::RunCompletedEvent;
use crate::events::RunStartedEvent;
use crate::events::VerificationSink;
use crate::report::RunReport;
use crate::resolver::MockEndpointResolver;
use crate::resolver::ResolveError;
use crate::resolver::validate_base_url;
use crate::transport::HttpTransport;
use crate::transport::PreparedRequest;
use crate::transport::ReqwestTransport;
use crate::transport::TransportError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing a verifier.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Base URL could not be resolved or is unusable.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Transport could not be created.
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Executes expectations against a mock endpoint.
pub struct ContractVerifier {
    /// Base URL that expectation paths are appended to.
    base_url: Url,
    /// Transport used for every request.
    transport: Box<dyn HttpTransport>,
    /// Event sink.
    sink: Arc<dyn VerificationSink>,
}

impl ContractVerifier {
    /// Creates a verifier using the default `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError`] when the config is invalid, the base URL is
    /// unusable, or the HTTP client cannot be built.
    pub fn new(base_url: Url, config: &VerifierConfig) -> Result<Self, VerifierError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config)?;
        Self::with_transport(base_url, Box::new(transport))
    }

    /// Resolves the base URL and creates a verifier.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError`] when resolution or construction fails.
    pub fn from_resolver(
        resolver: &dyn MockEndpointResolver,
        config: &VerifierConfig,
    ) -> Result<Self, VerifierError> {
        let base_url = resolver.resolve()?;
        Self::new(base_url, config)
    }

    /// Creates a verifier over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError::Resolve`] when the base URL is unusable.
    pub fn with_transport(
        base_url: Url,
        transport: Box<dyn HttpTransport>,
    ) -> Result<Self, VerifierError> {
        validate_base_url(&base_url)?;
        Ok(Self {
            base_url,
            transport,
            sink: Arc::new(NoopSink),
        })
    }

    /// Routes events to the given sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn VerificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Executes a single expectation.
    #[must_use]
    pub fn execute(&self, expectation: &Expectation) -> Outcome {
        let outcome = self.observe(expectation);
        self.sink.record_outcome(&OutcomeEvent::new(None, &outcome));
        outcome
    }

    /// Executes every expectation in order without short-circuiting.
    #[must_use]
    pub fn execute_all(&self, expectations: &[Expectation]) -> Vec<Outcome> {
        self.execute_until(expectations, || false)
    }

    /// Executes expectations in order until `stop` returns true.
    ///
    /// `stop` is checked before each expectation, so every returned outcome
    /// is complete; expectations after the stop point are not executed.
    pub fn execute_until<F>(&self, expectations: &[Expectation], mut stop: F) -> Vec<Outcome>
    where
        F: FnMut() -> bool,
    {
        let started = RunStartedEvent::new(self.base_url.as_str(), expectations.len());
        self.sink.record_run_started(&started);
        let mut outcomes = Vec::with_capacity(expectations.len());
        for (index, expectation) in expectations.iter().enumerate() {
            if stop() {
                break;
            }
            let outcome = self.observe(expectation);
            self.sink.record_outcome(&OutcomeEvent::new(Some(index), &outcome));
            outcomes.push(outcome);
        }
        self.sink.record_run_completed(&RunCompletedEvent::new(&outcomes, expectations.len()));
        outcomes
    }

    /// Executes every expectation and wraps the outcomes in a report.
    #[must_use]
    pub fn run(&self, expectations: &[Expectation]) -> RunReport {
        RunReport::new(self.execute_all(expectations))
    }

    /// Performs one timed exchange and evaluates it.
    fn observe(&self, expectation: &Expectation) -> Outcome {
        let request = match prepare_request(&self.base_url, expectation) {
            Ok(request) => request,
            Err(err) => return Outcome::transport_failure(expectation, 0, err),
        };
        let started = Instant::now();
        let result = self.transport.send(&request);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(response) => Outcome::evaluate(expectation, Observation {
                status: response.status,
                body: ResponseBody::from_bytes(&response.body),
                duration_ms,
            }),
            Err(err) => Outcome::transport_failure(expectation, duration_ms, err),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the request URL, headers, and body for an expectation.
///
/// The path is appended to the base URL's own path, so a base of
/// `http://host/rest/Library+API/1.0.0` keeps its prefix.
fn prepare_request(
    base_url: &Url,
    expectation: &Expectation,
) -> Result<PreparedRequest, TransportError> {
    let joined = format!("{}{}", base_url.as_str().trim_end_matches('/'), expectation.path());
    let mut url = Url::parse(&joined)
        .map_err(|err| TransportError::Request(format!("invalid request url {joined}: {err}")))?;
    if !expectation.query().is_empty() {
        url.query_pairs_mut().extend_pairs(expectation.query().iter());
    }
    let body = expectation
        .body()
        .map(serde_json::to_vec)
        .transpose()
        .map_err(|err| TransportError::Request(format!("request body encoding failed: {err}")))?;
    Ok(PreparedRequest {
        method: expectation.method(),
        url,
        headers: expectation
            .headers()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        body,
    })
}
