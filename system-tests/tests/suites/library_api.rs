// system-tests/tests/suites/library_api.rs
// ============================================================================
// Module: Library API Tests
// Description: Bundled contract suite against the in-process Library API mock.
// Purpose: Cover catalogue, error, delete, delay, and templating contracts.
// Dependencies: system-tests helpers
// ============================================================================

//! Library API contract tests against [`LibraryMockServer`].

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use contract_verifier::BodyMatcher;
use contract_verifier::ContractVerifier;
use contract_verifier::Expectation;
use contract_verifier::FailureKind;
use contract_verifier::HttpMethod;
use contract_verifier::MemorySink;
use contract_verifier::ResponseBody;
use contract_verifier::VerifierConfig;
use helpers::artifacts::TestReporter;
use helpers::timeouts::resolve_timeout;
use system_tests::ContractSuite;
use system_tests::LibraryMockServer;
use system_tests::SuiteError;
use system_tests::library_mock::LIBRARY_API_PREFIX;

use crate::helpers;

type TestResult = Result<(), Box<dyn Error>>;

fn config() -> VerifierConfig {
    let timeout = resolve_timeout(Duration::from_secs(10));
    VerifierConfig {
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        ..VerifierConfig::default()
    }
}

#[test]
fn library_suite_loads_in_declared_order() -> TestResult {
    let suite = ContractSuite::library_api()?;
    assert_eq!(suite.name(), "Library API");
    assert_eq!(suite.version(), Some("1.0.0"));
    let names: Vec<&str> = suite.expectations().iter().map(Expectation::name).collect();
    assert_eq!(names, vec![
        "list books",
        "get book by id",
        "book not found",
        "delete book 1",
        "delete book 2",
        "book lookup delay",
        "latest book templating",
    ]);
    let delay = suite.expectation("book lookup delay").ok_or("missing delay expectation")?;
    assert_eq!(delay.min_duration_ms(), Some(3_000));
    Ok(())
}

#[test]
fn library_suite_passes_against_mock() -> TestResult {
    let mut reporter = TestReporter::new("library_suite_passes_against_mock")?;
    let suite = ContractSuite::library_api()?;
    let mock = LibraryMockServer::start()?;
    assert!(mock.base_url().path().ends_with(LIBRARY_API_PREFIX));
    let verifier = ContractVerifier::from_resolver(&mock, &config())?;
    let report = verifier.run(suite.expectations());
    reporter.record_run("library_api", &report)?;

    assert!(report.is_success(), "{report}");
    assert_eq!(report.total(), suite.expectations().len());
    let listed = report.outcomes()[0].actual_body().as_json().ok_or("list body not json")?;
    assert_eq!(listed.as_array().map(Vec::len), Some(2));
    assert_eq!(report.outcomes()[3].actual_body(), &ResponseBody::Empty);
    assert_eq!(report.outcomes()[4].actual_body(), &ResponseBody::Empty);
    assert!(report.outcomes()[5].actual_duration_ms() >= 3_000);

    reporter.finish("pass", vec!["library suite passed against in-process mock".to_string()])?;
    Ok(())
}

#[test]
fn missing_delay_is_a_timing_violation_only() -> TestResult {
    let mut reporter = TestReporter::new("missing_delay_is_a_timing_violation_only")?;
    let suite = ContractSuite::library_api()?;
    let mock = LibraryMockServer::start_with_delay(Duration::ZERO)?;
    let verifier = ContractVerifier::from_resolver(&mock, &config())?;
    let report = verifier.run(suite.expectations());
    reporter.record_run("library_api_no_delay", &report)?;

    assert_eq!(report.failed(), 1, "{report}");
    let failed: Vec<&Expectation> =
        report.failures().map(|outcome| outcome.expectation()).collect();
    assert_eq!(failed[0].name(), "book lookup delay");
    let outcome = &report.outcomes()[5];
    assert_eq!(outcome.failures().len(), 1);
    assert!(outcome.has_failure(FailureKind::TimingViolation));
    assert_eq!(outcome.actual_status(), Some(200));

    reporter.finish("pass", vec!["timing floor reported without other failures".to_string()])?;
    Ok(())
}

#[test]
fn templated_values_are_checked_by_key_only() -> TestResult {
    let suite = ContractSuite::library_api()?;
    let latest = suite.expectation("latest book templating").ok_or("missing templating")?;
    let mock = LibraryMockServer::start_with_delay(Duration::ZERO)?;
    let verifier = ContractVerifier::from_resolver(&mock, &config())?;

    let first = verifier.execute(latest);
    let second = verifier.execute(latest);
    assert!(first.passed(), "{first}");
    assert!(second.passed(), "{second}");
    assert_ne!(first.actual_body(), second.actual_body());
    Ok(())
}

#[test]
fn templated_key_removal_is_reported() -> TestResult {
    let mock = LibraryMockServer::start_with_delay(Duration::ZERO)?;
    let verifier = ContractVerifier::from_resolver(&mock, &config())?;
    let expectation = Expectation::builder(HttpMethod::Get, "/books/latest")
        .status(200)
        .matcher(BodyMatcher::at("/dynamicValues", BodyMatcher::keys(["randomColor"])))
        .build()?;
    let outcome = verifier.execute(&expectation);
    assert!(outcome.has_failure(FailureKind::BodyMismatch));
    assert_eq!(
        outcome.failure_reason().as_deref(),
        Some("body_mismatch: $/dynamicValues/randomColor: missing key")
    );
    Ok(())
}

#[test]
fn unknown_book_delete_is_not_found() -> TestResult {
    let mock = LibraryMockServer::start_with_delay(Duration::ZERO)?;
    let verifier = ContractVerifier::from_resolver(&mock, &config())?;
    let expectation = Expectation::builder(HttpMethod::Delete, "/books/42").status(204).build()?;
    let outcome = verifier.execute(&expectation);
    assert_eq!(outcome.actual_status(), Some(404));
    assert!(outcome.has_failure(FailureKind::StatusMismatch));
    Ok(())
}

#[test]
fn stopped_mock_yields_transport_failures_for_whole_suite() -> TestResult {
    let suite = ContractSuite::library_api()?;
    let mock = LibraryMockServer::start_with_delay(Duration::ZERO)?;
    let sink = Arc::new(MemorySink::new());
    let verifier = ContractVerifier::from_resolver(&mock, &config())?.with_sink(sink.clone());
    drop(mock);

    let outcomes = verifier.execute_all(suite.expectations());
    assert_eq!(outcomes.len(), suite.expectations().len());
    assert!(outcomes.iter().all(|outcome| outcome.has_failure(FailureKind::Transport)));
    assert!(outcomes.iter().all(|outcome| outcome.actual_status().is_none()));
    assert_eq!(sink.events().len(), suite.expectations().len() + 2);
    Ok(())
}

#[test]
fn invalid_expectation_fails_suite_load() {
    let raw = r#"
        name = "Library API"

        [[expectation]]
        method = "GET"
        path = "/books"

        [[expectation]]
        name = "bad delay"
        method = "GET"
        path = "/books/1"
        min_duration_ms = 0
    "#;
    let err = ContractSuite::from_toml_str(raw, "inline").unwrap_err();
    match err {
        SuiteError::Invalid {
            index,
            label,
            ..
        } => {
            assert_eq!(index, 1);
            assert_eq!(label, "bad delay");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_and_unknown_suites_are_rejected() {
    let empty = ContractSuite::from_toml_str(r#"name = "Library API""#, "empty").unwrap_err();
    assert!(matches!(empty, SuiteError::Empty(_)));

    let unknown = r#"
        name = "Library API"
        [[expectation]]
        method = "GET"
        path = "/books"
        retries = 3
    "#;
    let err = ContractSuite::from_toml_str(unknown, "unknown").unwrap_err();
    assert!(matches!(err, SuiteError::Parse { .. }));
}

#[test]
fn suite_loads_from_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("suite.toml");
    std::fs::write(
        &path,
        r#"
            name = "Library API"
            [[expectation]]
            method = "delete"
            path = "/books/2"
            status = 204
        "#,
    )?;
    let suite = ContractSuite::load(&path)?;
    assert_eq!(suite.expectations()[0].method(), HttpMethod::Delete);
    assert_eq!(suite.expectations()[0].name(), "DELETE /books/2");

    let missing = ContractSuite::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(missing, SuiteError::Read { .. }));
    Ok(())
}
