//! Logging and observability
//!
//! This module provides:
//! - Structured console and JSON file logging via `tracing`
//! - A run-scoped [`ProgressReporter`] injected into each export run
//! - Helper macros for the common run events
//!
//! # Example
//!
//! ```no_run
//! use nightscout_export::logging::init_logging;
//! use nightscout_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod reporter;
pub mod structured;

pub use reporter::{MemoryReporter, ProgressReporter, RunStatus, TracingReporter};
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export run
///
/// # Example
///
/// ```no_run
/// use nightscout_export::log_run_start;
///
/// log_run_start!("entries", "https://ns.example.com");
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($data_type:expr, $source:expr) => {
        tracing::info!(
            data_type = %$data_type,
            source = %$source,
            "Starting export run"
        );
    };
}

/// Log the completion of an export run
///
/// # Example
///
/// ```no_run
/// use nightscout_export::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!("entries", 42u64, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($data_type:expr, $records:expr, $duration:expr) => {
        tracing::info!(
            data_type = %$data_type,
            records = $records,
            duration_ms = $duration.as_millis() as u64,
            "Export run completed"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use nightscout_export::log_retry_attempt;
///
/// log_retry_attempt!(2, 4, "status 502");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying window"
        );
    };
}
