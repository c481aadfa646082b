//! Run summary and outcome

use crate::core::fetch::Termination;
use crate::core::verification::VerificationReport;
use crate::domain::{DataType, OutputArtifact};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Identifier of the run, as carried by its log lines
    pub run_id: Option<Uuid>,

    /// Collection exported
    pub data_type: DataType,

    /// Finalized artifact
    pub artifact: OutputArtifact,

    /// Records written to the artifact
    pub records_written: u64,

    /// Windows answered by the source
    pub windows_fetched: u64,

    /// Why the fetch stopped
    pub termination: Termination,

    /// Distinct sensitive values replaced
    pub anonymized_values: usize,

    /// Duration of the run
    pub duration: Duration,

    /// Verification report (if verification was run)
    pub verification: Option<VerificationReport>,
}

impl RunSummary {
    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            data_type = %self.data_type,
            records = self.records_written,
            windows = self.windows_fetched,
            termination = ?self.termination,
            anonymized_values = self.anonymized_values,
            md5 = %self.artifact.metadata.md5,
            size_bytes = self.artifact.size_bytes,
            duration_secs = self.duration.as_secs(),
            path = %self.artifact.file_path.display(),
            "Export completed"
        );
    }
}

/// How a run ended without error
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Artifact finalized
    Completed(Box<RunSummary>),

    /// Stopped by the cancellation signal; the file at `file_path` is partial
    Cancelled {
        /// Records written before cancellation
        records_written: u64,
        /// Partial output the caller should remove
        file_path: PathBuf,
    },
}

impl RunOutcome {
    /// Summary of a completed run
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunOutcome::Completed(summary) => Some(summary),
            RunOutcome::Cancelled { .. } => None,
        }
    }

    /// Whether the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled { .. })
    }
}
