// system-tests/src/lib.rs
// ============================================================================
// Module: Contract Verifier System Tests Library
// Description: Shared configuration, fixtures, and mocks for system tests.
// Purpose: Provide common utilities for contract verifier system-test binaries.
// Dependencies: contract-verifier, tiny_http, toml
// ============================================================================

//! ## Overview
//! This crate hosts the Library API contract suite, an in-process mock that
//! serves the same contract, and environment configuration used by the
//! system-test binaries in `system-tests/tests`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod library_mock;
pub mod suite;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use library_mock::LibraryMockServer;
pub use suite::ContractSuite;
pub use suite::SuiteError;
