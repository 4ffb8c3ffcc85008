// crates/contract-verifier-core/src/outcome.rs
// ============================================================================
// Module: Verification Outcomes
// Description: Immutable result of executing one expectation.
// Purpose: Classify an observed response into soft failures.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An [`Outcome`] is built exactly once per executed [`Expectation`], either
//! from an [`Observation`] of a completed HTTP exchange or from a transport
//! failure. Status, body, and timing are all checked so a single outcome
//! reports every way the response diverged from the contract.
//! Invariants:
//! - Outcomes are complete at construction and expose no mutators.
//! - `passed()` is true iff no [`Failure`] was recorded.
//! - A transport failure carries no status and an empty body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::expectation::Expectation;

// ============================================================================
// SECTION: Response Body
// ============================================================================

/// Decoded response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    /// No bytes, or only whitespace.
    Empty,
    /// Body parsed as JSON.
    Json(Value),
    /// Body that is not valid JSON.
    Text(String),
}

impl ResponseBody {
    /// Decodes raw response bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        serde_json::from_slice(bytes).map_or_else(
            |_| Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            Self::Json,
        )
    }

    /// Returns true when the body is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the JSON value, if the body parsed as JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Empty | Self::Text(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Soft failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, timeout, or body read failure.
    #[serde(rename = "transport_error")]
    Transport,
    /// Status code differs from the expectation.
    StatusMismatch,
    /// Body failed its matcher.
    BodyMismatch,
    /// Call completed faster than the declared minimum duration.
    TimingViolation,
}

impl FailureKind {
    /// Returns the stable label for this failure kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport_error",
            Self::StatusMismatch => "status_mismatch",
            Self::BodyMismatch => "body_mismatch",
            Self::TimingViolation => "timing_violation",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Human-readable description.
    pub detail: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

// ============================================================================
// SECTION: Observation
// ============================================================================

/// What the transport observed for one completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Response status code.
    pub status: u16,
    /// Decoded response body.
    pub body: ResponseBody,
    /// Wall-clock duration of send plus body read, in milliseconds.
    pub duration_ms: u64,
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of executing one expectation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// The executed expectation.
    expectation: Expectation,
    /// Observed status; absent on transport failure.
    actual_status: Option<u16>,
    /// Observed body.
    actual_body: ResponseBody,
    /// Observed duration in milliseconds.
    actual_duration_ms: u64,
    /// Every failure detected, in check order.
    failures: Vec<Failure>,
}

impl Outcome {
    /// Evaluates an observation against its expectation.
    ///
    /// Checks run in a fixed order: status, body, timing.
    #[must_use]
    pub fn evaluate(expectation: &Expectation, observation: Observation) -> Self {
        let mut failures = Vec::new();
        if let Some(detail) = status_failure(expectation.expected_status(), observation.status) {
            failures.push(Failure {
                kind: FailureKind::StatusMismatch,
                detail,
            });
        }
        failures.extend(expectation.matcher().evaluate(&observation.body).into_iter().map(
            |mismatch| Failure {
                kind: FailureKind::BodyMismatch,
                detail: mismatch.to_string(),
            },
        ));
        if let Some(min) = expectation.min_duration_ms()
            && observation.duration_ms < min
        {
            failures.push(Failure {
                kind: FailureKind::TimingViolation,
                detail: format!(
                    "took {} ms, expected at least {min} ms",
                    observation.duration_ms
                ),
            });
        }
        Self {
            expectation: expectation.clone(),
            actual_status: Some(observation.status),
            actual_body: observation.body,
            actual_duration_ms: observation.duration_ms,
            failures,
        }
    }

    /// Records a transport failure for an expectation.
    #[must_use]
    pub fn transport_failure(
        expectation: &Expectation,
        duration_ms: u64,
        error: impl fmt::Display,
    ) -> Self {
        Self {
            expectation: expectation.clone(),
            actual_status: None,
            actual_body: ResponseBody::Empty,
            actual_duration_ms: duration_ms,
            failures: vec![Failure {
                kind: FailureKind::Transport,
                detail: error.to_string(),
            }],
        }
    }

    /// Returns the executed expectation.
    #[must_use]
    pub const fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// Returns the observed status, if a response was received.
    #[must_use]
    pub const fn actual_status(&self) -> Option<u16> {
        self.actual_status
    }

    /// Returns the observed body.
    #[must_use]
    pub const fn actual_body(&self) -> &ResponseBody {
        &self.actual_body
    }

    /// Returns the observed duration in milliseconds.
    #[must_use]
    pub const fn actual_duration_ms(&self) -> u64 {
        self.actual_duration_ms
    }

    /// Returns every recorded failure.
    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Returns true when no failure was recorded.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns true when a failure of `kind` was recorded.
    #[must_use]
    pub fn has_failure(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|failure| failure.kind == kind)
    }

    /// Returns all failures joined into one reason, if any.
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let reasons: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        Some(reasons.join("; "))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        write!(f, "{verdict} {} ({} ms)", self.expectation.name(), self.actual_duration_ms)?;
        if let Some(reason) = self.failure_reason() {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Describes a status mismatch, if any.
fn status_failure(expected: Option<u16>, actual: u16) -> Option<String> {
    match expected {
        Some(expected) if expected != actual => {
            Some(format!("expected status {expected}, found {actual}"))
        }
        Some(_) => None,
        None if (200 .. 300).contains(&actual) => None,
        None => Some(format!("expected a 2xx status, found {actual}")),
    }
}
