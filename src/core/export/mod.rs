//! Export orchestration
//!
//! This module ties the pipeline together for one collection:
//! - Run coordination and status reporting ([`ExportRun`])
//! - The anonymize-then-package record sink
//! - Summary and outcome reporting

pub mod coordinator;
pub mod pipeline;
pub mod summary;

pub use coordinator::ExportRun;
pub use pipeline::{PipelineSink, PipelineStats};
pub use summary::{RunOutcome, RunSummary};
