// system-tests/tests/suites/microcks.rs
// ============================================================================
// Module: Microcks Tests
// Description: Library API contract suite against a Microcks container.
// Purpose: Prove the bundled suite holds against the real mock server.
// Dependencies: system-tests helpers, testcontainers
// ============================================================================

//! Library API contract tests against Microcks.

use std::error::Error;
use std::time::Duration;

use contract_verifier::ContractVerifier;
use contract_verifier::MockEndpointResolver;
use contract_verifier::VerifierConfig;
use contract_verifier::sink_from_env;
use helpers::artifacts::TestReporter;
use helpers::microcks::MicrocksFixture;
use helpers::timeouts::resolve_timeout;
use system_tests::ContractSuite;
use system_tests::library_mock::LIBRARY_API_PREFIX;
use system_tests::suite::fixtures_dir;

use crate::helpers;

#[test]
fn library_contract_holds_against_microcks() -> Result<(), Box<dyn Error>> {
    let mut reporter = TestReporter::new("library_contract_holds_against_microcks")?;
    let suite = ContractSuite::library_api()?;
    let version = suite.version().ok_or("suite has no version")?;
    let fixture =
        MicrocksFixture::start(&fixtures_dir().join("library-api.yaml"), suite.name(), version)?;

    let mock_url = fixture.resolve()?;
    assert_eq!(mock_url.path(), LIBRARY_API_PREFIX);

    let timeout = resolve_timeout(Duration::from_secs(10));
    let config = VerifierConfig {
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        ..VerifierConfig::default()
    }
    .with_env_overrides()?;
    let verifier = ContractVerifier::from_resolver(&fixture, &config)?.with_sink(sink_from_env()?);
    let report = verifier.run(suite.expectations());
    reporter.record_run("microcks_library_api", &report)?;

    assert!(report.is_success(), "{report}");
    let delayed = suite.expectation("book lookup delay").ok_or("missing delay expectation")?;
    let delayed_outcome = report
        .outcomes()
        .iter()
        .find(|outcome| outcome.expectation() == delayed)
        .ok_or("delay outcome missing")?;
    assert!(delayed_outcome.actual_duration_ms() >= 3_000);

    reporter.finish("pass", vec![
        format!("microcks endpoint: {}", fixture.http_endpoint()),
        format!("mock endpoint: {mock_url}"),
    ])?;
    Ok(())
}
