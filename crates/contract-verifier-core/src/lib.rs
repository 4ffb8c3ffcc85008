// crates/contract-verifier-core/src/lib.rs
// ============================================================================
// Module: Contract Verifier Core
// Description: Expectation model, body matching, and outcome evaluation.
// Purpose: Provide the transport-free half of HTTP contract verification.
// Dependencies: serde, serde_json, bigdecimal, thiserror
// ============================================================================

//! ## Overview
//! `contract-verifier-core` defines what a contract check *is*: a validated
//! [`Expectation`] describing one HTTP call against a mock endpoint, a
//! [`BodyMatcher`] describing the response shape, and the immutable
//! [`Outcome`] produced once that call has been observed.
//! Invariants:
//! - Expectations are validated at construction and never change afterwards.
//! - Outcome evaluation is pure: the same observation always yields the same
//!   failures, in the same order.
//! - Soft failures (status, body, timing, transport) are data, not errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod expectation;
pub mod matcher;
pub mod outcome;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use expectation::Expectation;
pub use expectation::ExpectationBuilder;
pub use expectation::ExpectationError;
pub use expectation::ExpectationSpec;
pub use expectation::HttpMethod;
pub use matcher::BodyMatcher;
pub use matcher::BodyMismatch;
pub use outcome::Failure;
pub use outcome::FailureKind;
pub use outcome::Observation;
pub use outcome::Outcome;
pub use outcome::ResponseBody;
