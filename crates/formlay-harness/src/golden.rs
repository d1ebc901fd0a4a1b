#![forbid(unsafe_code)]

//! Golden checksums of layout dumps.
//!
//! A scenario produces one checksum per step: the BLAKE3 hash of the model
//! dump after the step settled. Expected checksums live in
//! `tests/golden/<scenario>.checksums` next to the test crate.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"start","run_id":"...","case":"form_resize","seed":0}
//! {"event":"step","run_id":"...","step":0,"name":"add_text_field","checksum":"blake3:..."}
//! {"event":"complete","run_id":"...","outcome":"pass","checksums":["blake3:..."]}
//! ```
//!
//! # Updating
//!
//! ```sh
//! BLESS=1 cargo test -p formlay-harness --test form_scenario
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::json;

const CHECKSUM_PREFIX: &str = "blake3:";

// ============================================================================
// Checksums
// ============================================================================

/// Checksum of a dump or any other text.
#[must_use]
pub fn compute_text_checksum(text: &str) -> String {
    format!("{CHECKSUM_PREFIX}{}", blake3::hash(text.as_bytes()).to_hex())
}

// ============================================================================
// JSONL Logger
// ============================================================================

/// JSONL event logger for golden runs.
pub struct GoldenLogger {
    writer: Option<BufWriter<File>>,
    run_id: String,
    checksums: Vec<String>,
}

impl GoldenLogger {
    pub fn new(path: &Path, run_id: &str) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            run_id: run_id.to_string(),
            checksums: Vec::new(),
        })
    }

    /// Logger that only collects checksums.
    #[must_use]
    pub fn noop(run_id: &str) -> Self {
        Self {
            writer: None,
            run_id: run_id.to_string(),
            checksums: Vec::new(),
        }
    }

    pub fn log_start(&mut self, case: &str, seed: u64) {
        let line = json!({"event": "start", "run_id": self.run_id, "case": case, "seed": seed});
        self.write_line(&line);
    }

    pub fn log_step(&mut self, step: usize, name: &str, checksum: &str) {
        self.checksums.push(checksum.to_string());
        let line = json!({
            "event": "step",
            "run_id": self.run_id,
            "step": step,
            "name": name,
            "checksum": checksum,
        });
        self.write_line(&line);
    }

    pub fn log_complete(&mut self, outcome: GoldenOutcome) {
        let line = json!({
            "event": "complete",
            "run_id": self.run_id,
            "outcome": outcome.as_str(),
            "checksums": self.checksums,
        });
        self.write_line(&line);
    }

    pub fn log_error(&mut self, message: &str) {
        let line = json!({"event": "error", "run_id": self.run_id, "message": message});
        self.write_line(&line);
    }

    #[must_use]
    pub fn checksums(&self) -> &[String] {
        &self.checksums
    }

    fn write_line(&mut self, line: &serde_json::Value) {
        if let Some(ref mut writer) = self.writer {
            let _ = writeln!(writer, "{line}");
            let _ = writer.flush();
        }
    }
}

/// Test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoldenOutcome {
    Pass,
    Fail,
    Skip,
}

impl GoldenOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
        }
    }
}

// ============================================================================
// Golden File Management
// ============================================================================

/// Path to the golden checksums file of a scenario.
#[must_use]
pub fn golden_checksum_path(base_dir: &Path, scenario_name: &str) -> PathBuf {
    base_dir
        .join("tests")
        .join("golden")
        .join(format!("{scenario_name}.checksums"))
}

/// Load expected checksums. A missing file yields no checksums.
pub fn load_golden_checksums(path: &Path) -> std::io::Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| l.trim().to_string())
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

pub fn save_golden_checksums(path: &Path, checksums: &[String]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = format!(
        "# Golden checksums - do not edit manually\n{}\n",
        checksums.join("\n")
    );
    fs::write(path, content)
}

/// Whether golden files should be rewritten (`BLESS=1`).
#[must_use]
pub fn is_bless_mode() -> bool {
    std::env::var("BLESS").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Compare checksums, returning the outcome and the first mismatching step.
///
/// An empty expectation (no golden file yet) fails.
#[must_use]
pub fn verify_checksums(actual: &[String], expected: &[String]) -> (GoldenOutcome, Option<usize>) {
    if expected.is_empty() || actual.len() != expected.len() {
        return (GoldenOutcome::Fail, None);
    }
    match actual.iter().zip(expected).position(|(a, e)| a != e) {
        Some(i) => (GoldenOutcome::Fail, Some(i)),
        None => (GoldenOutcome::Pass, None),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_prefixed_and_stable() {
        let a = compute_text_checksum("container Form\n");
        let b = compute_text_checksum("container Form\n");
        assert_eq!(a, b);
        assert!(a.starts_with(CHECKSUM_PREFIX));
        assert_eq!(a.len(), CHECKSUM_PREFIX.len() + 64);
        assert_ne!(a, compute_text_checksum("container Panel\n"));
    }

    #[test]
    fn verify_reports_first_mismatch() {
        let actual = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let expected = vec!["a".to_string(), "x".to_string(), "c".to_string()];
        assert_eq!(verify_checksums(&actual, &expected), (GoldenOutcome::Fail, Some(1)));
        assert_eq!(verify_checksums(&actual, &actual), (GoldenOutcome::Pass, None));
        assert_eq!(
            verify_checksums(&actual, &expected[..2]),
            (GoldenOutcome::Fail, None)
        );
        assert_eq!(verify_checksums(&actual, &[]), (GoldenOutcome::Fail, None));
    }

    #[test]
    fn checksum_file_round_trip_skips_comments() {
        let dir = std::env::temp_dir().join(format!("formlay_golden_{}", std::process::id()));
        let path = golden_checksum_path(&dir, "round_trip");
        let sums = vec![compute_text_checksum("one"), compute_text_checksum("two")];
        save_golden_checksums(&path, &sums).expect("save");
        assert_eq!(load_golden_checksums(&path).expect("load"), sums);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_loads_empty() {
        let path = Path::new("/nonexistent/formlay/golden.checksums");
        assert!(load_golden_checksums(path).expect("load").is_empty());
    }

    #[test]
    fn file_logger_appends_jsonl_events() {
        let dir = std::env::temp_dir().join(format!("formlay_jsonl_{}", std::process::id()));
        let path = dir.join("run.jsonl");
        for run in ["first", "second"] {
            let mut logger = GoldenLogger::new(&path, run).expect("open");
            logger.log_start("case", 7);
            logger.log_step(0, "step", "blake3:00");
            logger.log_complete(GoldenOutcome::Pass);
        }
        let content = fs::read_to_string(&path).expect("read");
        let events: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0]["event"], "start");
        assert_eq!(events[0]["seed"], 7);
        assert_eq!(events[3]["run_id"], "second");
        assert_eq!(events[5]["checksums"][0], "blake3:00");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn noop_logger_collects_checksums() {
        let mut logger = GoldenLogger::noop("run");
        logger.log_start("case", 0);
        logger.log_step(0, "first", "blake3:00");
        logger.log_complete(GoldenOutcome::Pass);
        assert_eq!(logger.checksums(), ["blake3:00".to_string()]);
    }
}
