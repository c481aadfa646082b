//! Run-scoped progress reporting
//!
//! Components never reach for global state to report progress. Each run is
//! handed a [`ProgressReporter`] that lives exactly as long as the run, and
//! the reporter decides where the messages go.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

/// Lifecycle state of one export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run accepted, nothing fetched yet
    Initiated,
    /// Windows are being fetched
    InProgress,
    /// Artifact finalized
    Complete,
    /// Run aborted by a fatal error
    Failed,
    /// Run stopped by a cancellation signal
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Initiated => "Initiated",
            RunStatus::InProgress => "In progress",
            RunStatus::Complete => "Complete",
            RunStatus::Failed => "Failed",
            RunStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// Sink for human-readable progress of a single run
pub trait ProgressReporter: Send + Sync {
    /// Record a progress message such as the window being queried
    fn update(&self, message: &str);

    /// Record a lifecycle transition
    fn set_status(&self, status: RunStatus);

    /// Most recent status line, stamped with the time it was recorded
    fn last_status(&self) -> Option<String> {
        None
    }

    /// Identifier of the run, when the reporter assigns one
    fn run_id(&self) -> Option<Uuid> {
        None
    }
}

fn stamp(message: &str) -> String {
    format!("{} ({})", message, Utc::now().format("%Y-%m-%d %H:%M:%S%:z"))
}

/// Reporter that forwards to `tracing`, tagged with a per-run id
pub struct TracingReporter {
    run_id: Uuid,
    label: String,
    last: Mutex<Option<String>>,
}

impl TracingReporter {
    /// Create a reporter for one run, identified by `label` (e.g. the data type)
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            label: label.into(),
            last: Mutex::new(None),
        }
    }

    /// Identifier attached to every message of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Span covering the run; enter it around the run's work
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("export_run", run_id = %self.run_id, run = %self.label)
    }

    fn remember(&self, line: String) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(line);
        }
    }
}

impl ProgressReporter for TracingReporter {
    fn update(&self, message: &str) {
        tracing::debug!(run_id = %self.run_id, run = %self.label, "{message}");
        self.remember(stamp(message));
    }

    fn set_status(&self, status: RunStatus) {
        tracing::info!(run_id = %self.run_id, run = %self.label, status = %status, "Run status changed");
        self.remember(stamp(&status.to_string()));
    }

    fn last_status(&self) -> Option<String> {
        self.last.lock().ok().and_then(|last| last.clone())
    }

    fn run_id(&self) -> Option<Uuid> {
        Some(self.run_id)
    }
}

/// Reporter that keeps every message in memory
#[derive(Default)]
pub struct MemoryReporter {
    messages: Mutex<Vec<String>>,
    statuses: Mutex<Vec<RunStatus>>,
}

impl MemoryReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress messages recorded so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Status transitions recorded so far
    pub fn statuses(&self) -> Vec<RunStatus> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl ProgressReporter for MemoryReporter {
    fn update(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }

    fn set_status(&self, status: RunStatus) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push(status);
        }
    }

    fn last_status(&self) -> Option<String> {
        self.statuses
            .lock()
            .ok()
            .and_then(|s| s.last().map(|status| status.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_records_in_order() {
        let reporter = MemoryReporter::new();
        reporter.set_status(RunStatus::Initiated);
        reporter.update("Querying entries");
        reporter.set_status(RunStatus::Complete);

        assert_eq!(reporter.messages(), vec!["Querying entries".to_string()]);
        assert_eq!(
            reporter.statuses(),
            vec![RunStatus::Initiated, RunStatus::Complete]
        );
        assert_eq!(reporter.last_status().as_deref(), Some("Complete"));
    }

    #[test]
    fn test_tracing_reporter_keeps_last_status() {
        let reporter = TracingReporter::new("entries");
        assert!(reporter.last_status().is_none());

        reporter.update("Querying entries from a to b...");
        let last = reporter.last_status().unwrap();
        assert!(last.starts_with("Querying entries from a to b... ("));

        reporter.set_status(RunStatus::Failed);
        assert!(reporter.last_status().unwrap().starts_with("Failed ("));
    }

    #[test]
    fn test_run_ids_are_distinct() {
        let a = TracingReporter::new("entries");
        let b = TracingReporter::new("entries");
        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(ProgressReporter::run_id(&a), Some(a.run_id()));
        assert!(ProgressReporter::run_id(&MemoryReporter::new()).is_none());
    }
}
