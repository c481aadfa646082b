//! Verification report structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of re-reading one artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// When the verification was performed
    pub verified_at: DateTime<Utc>,

    /// Artifact that was checked
    pub file_path: PathBuf,

    /// Checks that passed
    pub passed: usize,

    /// Checks that failed, with details
    pub failures: Vec<VerificationFailure>,

    /// Top-level elements of the decompressed document, when it is an array
    pub record_count: Option<u64>,

    /// Duration of verification in milliseconds
    pub duration_ms: u64,
}

/// Details of a failed check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationFailure {
    /// Name of the check (`md5`, `sha256`, `json`, `record_count`)
    pub check: String,

    /// Expected value
    pub expected: String,

    /// Value found
    pub actual: String,
}

impl VerificationReport {
    /// Create an empty report for `file_path`
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            verified_at: Utc::now(),
            file_path: file_path.into(),
            passed: 0,
            failures: Vec::new(),
            record_count: None,
            duration_ms: 0,
        }
    }

    /// Record a passed check
    pub fn record_pass(&mut self) {
        self.passed += 1;
    }

    /// Record a failed check
    pub fn record_failure(
        &mut self,
        check: &str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) {
        self.failures.push(VerificationFailure {
            check: check.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        });
    }

    /// Compare two values and record the result under `check`
    pub fn compare(&mut self, check: &str, expected: &str, actual: &str) {
        if expected == actual {
            self.record_pass();
        } else {
            self.record_failure(check, expected, actual);
        }
    }

    /// Set the duration of verification
    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// Whether every check passed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Format the report as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("📊 Verification Report\n");
        summary.push_str(&format!("  File: {}\n", self.file_path.display()));
        summary.push_str(&format!("  Verified at: {}\n", self.verified_at));
        summary.push_str(&format!("  Duration: {} ms\n", self.duration_ms));
        summary.push_str(&format!("  ✅ Passed: {}\n", self.passed));
        summary.push_str(&format!("  ❌ Failed: {}\n", self.failures.len()));
        if let Some(count) = self.record_count {
            summary.push_str(&format!("  Records: {count}\n"));
        }

        if !self.failures.is_empty() {
            summary.push_str("\n❌ Failures:\n");
            for (i, failure) in self.failures.iter().enumerate() {
                summary.push_str(&format!("  {}. {}\n", i + 1, failure.check));
                summary.push_str(&format!("     Expected: {}\n", failure.expected));
                summary.push_str(&format!("     Actual: {}\n", failure.actual));
            }
        }

        summary
    }
}
