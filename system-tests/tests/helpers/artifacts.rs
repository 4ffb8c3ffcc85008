// system-tests/tests/helpers/artifacts.rs
// ============================================================================
// Module: Test Artifacts
// Description: Per-test artifact roots, run reports, and summaries.
// Purpose: Persist verification results for inspection after a run.
// Dependencies: system-tests, contract-verifier, serde, serde_jcs
// ============================================================================

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use contract_verifier::RunReport;
use serde::Serialize;
use system_tests::config::SystemTestConfig;

#[derive(Debug, Serialize)]
struct TestSummary {
    test_name: String,
    status: String,
    started_at_ms: u128,
    ended_at_ms: u128,
    duration_ms: u128,
    expectations: usize,
    failed: usize,
    notes: Vec<String>,
    artifacts: Vec<String>,
}

fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

fn default_run_root(test_name: &str) -> PathBuf {
    PathBuf::from("target/system-tests").join(format!("run_{}", now_millis())).join(test_name)
}

/// Artifact directory for a single system-test.
#[derive(Debug, Clone)]
pub struct TestArtifacts {
    root: PathBuf,
}

impl TestArtifacts {
    /// Creates the artifact root for a test.
    pub fn new(test_name: &str) -> io::Result<Self> {
        let config = SystemTestConfig::load().map_err(io::Error::other)?;
        let root = config
            .run_root
            .map_or_else(|| default_run_root(test_name), |root| root.join(test_name));
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
        })
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        let bytes = serde_jcs::to_vec(value).map_err(|err| io::Error::other(err.to_string()))?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Writes a UTF-8 text artifact.
    pub fn write_text(&self, name: &str, value: &str) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, value.as_bytes())?;
        Ok(path)
    }
}

/// Records run reports and writes a summary even when a test panics.
pub struct TestReporter {
    artifacts: TestArtifacts,
    test_name: String,
    started_at_ms: u128,
    expectations: usize,
    failed: usize,
    written: Vec<String>,
    finalized: bool,
}

impl TestReporter {
    /// Creates a reporter for the named test.
    pub fn new(test_name: &str) -> io::Result<Self> {
        Ok(Self {
            artifacts: TestArtifacts::new(test_name)?,
            test_name: test_name.to_string(),
            started_at_ms: now_millis(),
            expectations: 0,
            failed: 0,
            written: Vec::new(),
            finalized: false,
        })
    }

    /// Persists a run report as `{label}.json` and `{label}.txt`.
    pub fn record_run(&mut self, label: &str, report: &RunReport) -> io::Result<()> {
        self.artifacts.write_json(&format!("{label}.json"), report)?;
        self.artifacts.write_text(&format!("{label}.txt"), &format!("{report}\n"))?;
        self.expectations += report.total();
        self.failed += report.failed();
        self.written.push(format!("{label}.json"));
        self.written.push(format!("{label}.txt"));
        Ok(())
    }

    /// Writes the final summary for the test.
    pub fn finish(&mut self, status: &str, notes: Vec<String>) -> io::Result<()> {
        let ended_at_ms = now_millis();
        let summary = TestSummary {
            test_name: self.test_name.clone(),
            status: status.to_string(),
            started_at_ms: self.started_at_ms,
            ended_at_ms,
            duration_ms: ended_at_ms.saturating_sub(self.started_at_ms),
            expectations: self.expectations,
            failed: self.failed,
            notes,
            artifacts: self.written.clone(),
        };
        self.artifacts.write_json("summary.json", &summary)?;
        self.artifacts.write_text("summary.md", &summary_markdown(&summary))?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for TestReporter {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        let status = if std::thread::panicking() { "panic" } else { "unknown" };
        let _ = self.finish(status, vec!["test terminated without explicit summary".to_string()]);
    }
}

fn summary_markdown(summary: &TestSummary) -> String {
    let mut lines = vec![
        "# System-Test Summary".to_string(),
        String::new(),
        "## Status".to_string(),
        String::new(),
        format!("- Test: {}", summary.test_name),
        format!("- Status: {}", summary.status),
        format!("- Duration (ms): {}", summary.duration_ms),
        format!("- Expectations: {} ({} failed)", summary.expectations, summary.failed),
        String::new(),
        "## Notes".to_string(),
        String::new(),
    ];
    lines.extend(bullets(&summary.notes));
    lines.extend([String::new(), "## Artifacts".to_string(), String::new()]);
    lines.extend(bullets(&summary.artifacts));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn bullets(items: &[String]) -> Vec<String> {
    if items.is_empty() {
        return vec!["- None".to_string()];
    }
    items.iter().map(|item| format!("- {item}")).collect()
}
