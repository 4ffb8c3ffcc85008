// crates/contract-verifier/src/events.rs
// ============================================================================
// Module: Verification Events
// Description: Structured run and outcome events for contract verification.
// Purpose: Emit JSON-line logs without a hard logging dependency.
// Dependencies: contract-verifier-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The verifier reports progress as structured events routed to a
//! [`VerificationSink`]. Sinks write JSON lines to stderr or a file, capture
//! events in memory for runners, or drop them. Response bodies are never
//! logged; only status, duration, and failure descriptions are.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use contract_verifier_core::Failure;
use contract_verifier_core::HttpMethod;
use contract_verifier_core::Outcome;
use serde::Serialize;
use serde_json::Value;

use crate::config::ConfigError;
use crate::config::VerifierEnv;
use crate::config::read_env_nonempty;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event emitted before a run executes its first expectation.
#[derive(Debug, Clone, Serialize)]
pub struct RunStartedEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Mock endpoint base URL.
    pub base_url: String,
    /// Number of expectations scheduled.
    pub expectations: usize,
}

/// Event emitted for each executed expectation.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Position in the run, when executed as part of one.
    pub index: Option<usize>,
    /// Expectation label.
    pub name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request target (`METHOD path?query`).
    pub target: String,
    /// Whether the expectation passed.
    pub passed: bool,
    /// Observed status, if a response was received.
    pub actual_status: Option<u16>,
    /// Observed duration in milliseconds.
    pub duration_ms: u64,
    /// Recorded failures.
    pub failures: Vec<Failure>,
}

/// Event emitted after a run stops.
#[derive(Debug, Clone, Serialize)]
pub struct RunCompletedEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Expectations executed.
    pub executed: usize,
    /// Expectations that passed.
    pub passed: usize,
    /// Expectations that failed.
    pub failed: usize,
    /// True when the run stopped before executing every expectation.
    pub cancelled: bool,
}

impl RunStartedEvent {
    /// Creates a run-started event with a consistent timestamp.
    #[must_use]
    pub fn new(base_url: &str, expectations: usize) -> Self {
        Self {
            event: "run_started",
            timestamp_ms: now_millis(),
            base_url: base_url.to_string(),
            expectations,
        }
    }
}

impl OutcomeEvent {
    /// Creates an outcome event from a completed outcome.
    #[must_use]
    pub fn new(index: Option<usize>, outcome: &Outcome) -> Self {
        let expectation = outcome.expectation();
        Self {
            event: "expectation_outcome",
            timestamp_ms: now_millis(),
            index,
            name: expectation.name().to_string(),
            method: expectation.method(),
            target: expectation.target(),
            passed: outcome.passed(),
            actual_status: outcome.actual_status(),
            duration_ms: outcome.actual_duration_ms(),
            failures: outcome.failures().to_vec(),
        }
    }
}

impl RunCompletedEvent {
    /// Creates a run-completed event from the executed outcomes.
    #[must_use]
    pub fn new(outcomes: &[Outcome], scheduled: usize) -> Self {
        let passed = outcomes.iter().filter(|outcome| outcome.passed()).count();
        Self {
            event: "run_completed",
            timestamp_ms: now_millis(),
            executed: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            cancelled: outcomes.len() < scheduled,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for verification events.
pub trait VerificationSink: Send + Sync {
    /// Record an outcome event.
    fn record_outcome(&self, event: &OutcomeEvent);

    /// Record a run-started event.
    fn record_run_started(&self, _event: &RunStartedEvent) {}

    /// Record a run-completed event.
    fn record_run_completed(&self, _event: &RunCompletedEvent) {}
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink that logs JSON lines to stderr.
pub struct StderrSink;

impl VerificationSink for StderrSink {
    fn record_outcome(&self, event: &OutcomeEvent) {
        write_stderr(event);
    }

    fn record_run_started(&self, event: &RunStartedEvent) {
        write_stderr(event);
    }

    fn record_run_completed(&self, event: &RunCompletedEvent) {
        write_stderr(event);
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Serializes an event and appends it as one line.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl VerificationSink for FileSink {
    fn record_outcome(&self, event: &OutcomeEvent) {
        self.append(event);
    }

    fn record_run_started(&self, event: &RunStartedEvent) {
        self.append(event);
    }

    fn record_run_completed(&self, event: &RunCompletedEvent) {
        self.append(event);
    }
}

/// No-op sink.
pub struct NoopSink;

impl VerificationSink for NoopSink {
    fn record_outcome(&self, _event: &OutcomeEvent) {}
}

/// Sink that keeps events in memory, in emission order.
#[derive(Default)]
pub struct MemorySink {
    /// Captured events as JSON values.
    events: Mutex<Vec<Value>>,
}

impl MemorySink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the captured events.
    ///
    /// A lock poisoned by a panicking writer still yields every event
    /// captured before the panic.
    #[must_use]
    pub fn events(&self) -> Vec<Value> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Captures an event.
    fn capture<T: Serialize>(&self, event: &T) {
        if let Ok(value) = serde_json::to_value(event) {
            self.events.lock().unwrap_or_else(PoisonError::into_inner).push(value);
        }
    }
}

impl VerificationSink for MemorySink {
    fn record_outcome(&self, event: &OutcomeEvent) {
        self.capture(event);
    }

    fn record_run_started(&self, event: &RunStartedEvent) {
        self.capture(event);
    }

    fn record_run_completed(&self, event: &RunCompletedEvent) {
        self.capture(event);
    }
}

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Builds a sink from `CONTRACT_VERIFIER_EVENT_LOG`.
///
/// `stderr` selects [`StderrSink`]; any other value is a file path for
/// [`FileSink`]. When unset, events are dropped.
///
/// # Errors
///
/// Returns [`ConfigError`] when the variable is invalid or the file cannot be
/// opened.
pub fn sink_from_env() -> Result<Arc<dyn VerificationSink>, ConfigError> {
    let name = VerifierEnv::EventLog.as_str();
    match read_env_nonempty(name)? {
        None => Ok(Arc::new(NoopSink)),
        Some(value) if value.trim().eq_ignore_ascii_case("stderr") => Ok(Arc::new(StderrSink)),
        Some(value) => {
            let sink = FileSink::new(Path::new(value.trim())).map_err(|err| {
                ConfigError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("cannot open event log: {err}"),
                }
            })?;
            Ok(Arc::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current time in milliseconds since the Unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Writes one serialized event line to stderr.
fn write_stderr<T: Serialize>(event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(std::io::stderr(), "{payload}");
    }
}
