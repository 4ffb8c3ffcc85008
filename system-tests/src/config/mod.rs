// system-tests/src/config/mod.rs
// ============================================================================
// Module: System Test Configuration
// Description: Centralized configuration for contract verifier system tests.
// Purpose: Provide typed access to test environment settings and defaults.
// Dependencies: contract-verifier
// ============================================================================

//! ## Overview
//! System-test configuration is read from environment variables and mapped into
//! a small typed structure for reuse across test helpers.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::DEFAULT_MICROCKS_IMAGE;
pub use env::SystemTestConfig;
pub use env::SystemTestEnv;
