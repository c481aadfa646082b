//! Export run - orchestrates one collection from windows to artifact
//!
//! Wires the window plan, fetcher, anonymizer, packager and finalizer for a
//! single [`FetchRequest`]. Every exit path reports a status; removing a
//! partial file after failure or cancellation is left to the caller.

use crate::anonymization::FieldAnonymizer;
use crate::core::export::pipeline::PipelineSink;
use crate::core::export::summary::{RunOutcome, RunSummary};
use crate::core::fetch::{FetchPolicy, PaginatedFetcher, RecordSource};
use crate::core::finalize::finalize_artifact;
use crate::core::package::{PayloadShape, StreamingPackager};
use crate::core::verification::Verifier;
use crate::domain::{ExportError, FetchRequest, Result};
use crate::logging::{ProgressReporter, RunStatus};
use crate::{log_run_complete, log_run_start};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// One export run over a record source
pub struct ExportRun {
    source: Arc<dyn RecordSource>,
    reporter: Arc<dyn ProgressReporter>,
    policy: FetchPolicy,
    anonymize: bool,
    seed: Option<u64>,
    verify: bool,
    cancel: Option<watch::Receiver<bool>>,
}

impl ExportRun {
    /// Create a run with the default retry policy and anonymization on
    pub fn new(source: Arc<dyn RecordSource>, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            source,
            reporter,
            policy: FetchPolicy::default(),
            anonymize: true,
            seed: None,
            verify: false,
            cancel: None,
        }
    }

    /// Use `policy` for every request
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable field anonymization
    pub fn with_anonymization(mut self, enabled: bool, seed: Option<u64>) -> Self {
        self.anonymize = enabled;
        self.seed = seed;
        self
    }

    /// Re-read the artifact after finalization
    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Stop between windows once `signal` is set
    pub fn with_cancellation(mut self, signal: watch::Receiver<bool>) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Execute the run, writing the artifact into `output_dir`
    ///
    /// This is the main entry point for a run. It:
    /// 1. Opens the artifact file and the record pipeline
    /// 2. Fetches every window, anonymizing and packaging records as they arrive
    /// 3. Closes the artifact and computes its checksums and metadata
    /// 4. Optionally verifies the artifact
    ///
    /// # Errors
    ///
    /// Any fatal error fails the run. The partial file is left in place.
    pub async fn execute(&self, request: &FetchRequest, output_dir: &Path) -> Result<RunOutcome> {
        let start = Instant::now();
        self.reporter.set_status(RunStatus::Initiated);
        log_run_start!(request.data_type, request.source_base_url);

        std::fs::create_dir_all(output_dir).map_err(|e| {
            ExportError::Io(format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;
        let path = output_dir.join(request.artifact_file_name());

        match self.run(request, path, start).await {
            Ok(outcome) => {
                let status = if outcome.is_cancelled() {
                    RunStatus::Cancelled
                } else {
                    RunStatus::Complete
                };
                self.reporter.set_status(status);
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(data_type = %request.data_type, error = %e, "Export run failed");
                self.reporter.set_status(RunStatus::Failed);
                Err(e)
            }
        }
    }

    async fn run(&self, request: &FetchRequest, path: PathBuf, start: Instant) -> Result<RunOutcome> {
        let data_type = request.data_type;

        let packager =
            StreamingPackager::create(&path, PayloadShape::for_data_type(data_type))?;
        let anonymizer = if self.anonymize {
            FieldAnonymizer::for_data_type(data_type, self.seed)
        } else {
            None
        };
        let mut sink = PipelineSink::new(packager, anonymizer);

        let mut fetcher =
            PaginatedFetcher::new(self.source.clone(), self.reporter.clone(), self.policy.clone());
        if let Some(signal) = &self.cancel {
            fetcher = fetcher.with_cancellation(signal.clone());
        }

        self.reporter.set_status(RunStatus::InProgress);
        let fetched = fetcher.fetch(request, &mut sink).await?;
        let stats = sink.close()?;

        if fetched.is_cancelled() {
            tracing::warn!(
                data_type = %data_type,
                records = stats.records_written,
                "Export run cancelled"
            );
            return Ok(RunOutcome::Cancelled {
                records_written: stats.records_written,
                file_path: path,
            });
        }

        let artifact = finalize_artifact(request, &path).await?;

        let verification = if self.verify {
            let verifier = if data_type.is_paginated() {
                Verifier::new().expect_records(stats.records_written)
            } else {
                Verifier::new()
            };
            let report = verifier.verify_artifact(&artifact)?;
            if !report.is_success() {
                return Err(ExportError::Verification(report.format_summary()));
            }
            Some(report)
        } else {
            None
        };

        let duration = start.elapsed();
        log_run_complete!(data_type, stats.records_written, duration);

        let summary = RunSummary {
            run_id: self.reporter.run_id(),
            data_type,
            artifact,
            records_written: stats.records_written,
            windows_fetched: fetched.windows,
            termination: fetched.termination,
            anonymized_values: stats.anonymized_values,
            duration,
            verification,
        };
        summary.log_summary();

        Ok(RunOutcome::Completed(Box::new(summary)))
    }
}
