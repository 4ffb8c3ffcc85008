// crates/contract-verifier/src/report.rs
// ============================================================================
// Module: Run Report
// Description: Aggregated view over the outcomes of one verification run.
// Purpose: Summarize pass/fail counts without losing per-expectation detail.
// Dependencies: contract-verifier-core, serde
// ============================================================================

//! ## Overview
//! [`RunReport`] wraps the ordered outcomes of a run. It never reorders or
//! drops outcomes; counts are derived on demand.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use contract_verifier_core::Outcome;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeStruct;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Ordered outcomes of a verification run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Outcomes in execution order.
    outcomes: Vec<Outcome>,
}

impl RunReport {
    /// Wraps outcomes in a report.
    #[must_use]
    pub const fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            outcomes,
        }
    }

    /// Returns the outcomes in execution order.
    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Consumes the report, returning the outcomes.
    #[must_use]
    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }

    /// Returns the number of executed expectations.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns the number of passing outcomes.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.passed()).count()
    }

    /// Returns the number of failing outcomes.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Returns true when every outcome passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(Outcome::passed)
    }

    /// Iterates over failing outcomes in execution order.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        write!(f, "{} passed, {} failed, {} total", self.passed(), self.failed(), self.total())
    }
}

impl Serialize for RunReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RunReport", 4)?;
        state.serialize_field("total", &self.total())?;
        state.serialize_field("passed", &self.passed())?;
        state.serialize_field("failed", &self.failed())?;
        state.serialize_field("outcomes", &self.outcomes)?;
        state.end()
    }
}
