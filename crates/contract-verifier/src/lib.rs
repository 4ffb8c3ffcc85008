// crates/contract-verifier/src/lib.rs
// ============================================================================
// Module: Contract Verifier
// Description: HTTP execution of contract expectations against mock endpoints.
// Purpose: Run expectations in order and collect one outcome per expectation.
// Dependencies: contract-verifier-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! This crate executes [`Expectation`]s from `contract-verifier-core` against
//! a mock endpoint. A [`MockEndpointResolver`] supplies the base URL, an
//! [`HttpTransport`] performs the exchange, and a [`VerificationSink`]
//! receives structured events as outcomes are produced.
//! Invariants:
//! - Runs are sequential, preserve input order, and never short-circuit.
//! - Transport failures are recorded as outcomes, not raised as errors.
//! - Construction errors (bad config, unusable base URL) fail before any
//!   request is issued.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod events;
pub mod report;
pub mod resolver;
pub mod transport;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::VerifierConfig;
pub use config::VerifierEnv;
pub use contract_verifier_core::BodyMatcher;
pub use contract_verifier_core::Expectation;
pub use contract_verifier_core::ExpectationError;
pub use contract_verifier_core::Failure;
pub use contract_verifier_core::FailureKind;
pub use contract_verifier_core::HttpMethod;
pub use contract_verifier_core::Outcome;
pub use contract_verifier_core::ResponseBody;
pub use events::FileSink;
pub use events::MemorySink;
pub use events::NoopSink;
pub use events::StderrSink;
pub use events::VerificationSink;
pub use events::sink_from_env;
pub use report::RunReport;
pub use resolver::EnvEndpoint;
pub use resolver::MockEndpointResolver;
pub use resolver::ResolveError;
pub use resolver::StaticEndpoint;
pub use transport::HttpTransport;
pub use transport::PreparedRequest;
pub use transport::RawResponse;
pub use transport::ReqwestTransport;
pub use transport::TransportError;
pub use verifier::ContractVerifier;
pub use verifier::VerifierError;
