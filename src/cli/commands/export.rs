//! Export command implementation
//!
//! This module implements the `export` command, which pulls each configured
//! Nightscout collection into its own gzip JSON artifact.

use crate::adapters::nightscout::{normalize_url, NightscoutClient};
use crate::config::{parse_config_file, parse_data_type_list, NsExportConfig};
use crate::core::export::{ExportRun, RunOutcome};
use crate::core::fetch::{FetchPolicy, RecordSource};
use crate::core::finalize::write_metadata_sidecar;
use crate::domain::{parse_date_bound, ExportError, FetchRequest, Result};
use crate::logging::{ProgressReporter, TracingReporter};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Override the Nightscout site URL
    #[arg(long)]
    pub url: Option<String>,

    /// Newest date to export (YYYY-MM-DD or RFC 3339, default: today)
    #[arg(long)]
    pub before: Option<String>,

    /// Oldest date to export (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub after: Option<String>,

    /// Override data type(s) to export (comma-separated)
    #[arg(long)]
    pub data_type: Option<String>,

    /// Override the output directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Keep identifying fields as they are
    #[arg(long)]
    pub no_anonymize: bool,

    /// Seed for anonymization tokens
    #[arg(long)]
    pub seed: Option<u64>,

    /// Re-read every artifact after it is written
    #[arg(long)]
    pub verify: bool,
}

/// Outcome of one collection within the command
enum TypeResult {
    Exported,
    Failed,
    Cancelled,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = if Path::new(config_path).exists() {
            match parse_config_file(config_path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load configuration");
                    eprintln!("Failed to load configuration: {e}");
                    return Ok(2);
                }
            }
        } else {
            tracing::info!(config_path = %config_path, "No configuration file, using defaults");
            NsExportConfig::default()
        };

        if let Err(e) = self.apply_overrides(&mut config) {
            eprintln!("Invalid argument: {e}");
            return Ok(2);
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2); // Configuration error exit code
        }

        let (before, after) = match resolve_dates(&config) {
            Ok(bounds) => bounds,
            Err(e) => {
                eprintln!("Invalid date range: {e}");
                return Ok(2);
            }
        };

        let base_url = match normalize_url(&config.source.base_url, &config.source).await {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "Nightscout site unreachable");
                eprintln!("Nightscout site unreachable: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let client: Arc<dyn RecordSource> =
            Arc::new(NightscoutClient::new(base_url.clone(), &config.source)?);
        let output_dir = PathBuf::from(&config.export.output_dir);

        println!("🚀 Exporting from {base_url}");
        println!(
            "   Range: {} to {}",
            after
                .map(|a| a.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "earliest".to_string()),
            before.format("%Y-%m-%d")
        );
        println!();

        let mut failed = 0usize;
        for data_type in &config.export.data_types {
            if *shutdown_signal.borrow() {
                println!("⚠️  Export cancelled before {data_type}");
                return Ok(3);
            }

            let request = FetchRequest::new(*data_type, base_url.clone(), before, after)?;
            match run_one(&config, &client, &request, &output_dir, shutdown_signal.clone()).await {
                TypeResult::Exported => {}
                TypeResult::Failed => failed += 1,
                TypeResult::Cancelled => {
                    println!();
                    println!("⚠️  Export cancelled. Partial output removed.");
                    tracing::info!("Export interrupted by user signal");
                    return Ok(3);
                }
            }
        }

        println!();
        if failed == 0 {
            println!("✅ Export completed successfully!");
            Ok(0)
        } else {
            println!(
                "⚠️  Export completed with failures ({failed} of {} data types)",
                config.export.data_types.len()
            );
            Ok(1)
        }
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut NsExportConfig) -> Result<()> {
        if let Some(url) = &self.url {
            tracing::info!(url = %url, "Overriding source URL from CLI");
            config.source.base_url = url.clone();
        }

        if let Some(before) = &self.before {
            config.export.before_date = Some(before.clone());
        }

        if let Some(after) = &self.after {
            config.export.after_date = Some(after.clone());
        }

        if let Some(types) = &self.data_type {
            let data_types = parse_data_type_list(types)?;
            tracing::info!(data_types = ?data_types, "Overriding data types from CLI");
            config.export.data_types = data_types;
        }

        if let Some(dir) = &self.output_dir {
            config.export.output_dir = dir.clone();
        }

        if self.no_anonymize {
            tracing::info!("Disabling anonymization from CLI");
            config.export.anonymize = false;
        }

        if self.seed.is_some() {
            config.export.anonymization_seed = self.seed;
        }

        if self.verify {
            config.verification.enable_verification = true;
        }

        Ok(())
    }
}

/// Resolve the configured date range, defaulting `before` to today (UTC midnight)
pub fn resolve_dates(config: &NsExportConfig) -> Result<(DateTime<Utc>, Option<DateTime<Utc>>)> {
    let before = match config.export.before_date.as_deref() {
        Some(value) => parse_date_bound(value)?,
        None => Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .ok_or_else(|| ExportError::Other("Failed to compute today's date".to_string()))?,
    };
    let after = config
        .export
        .after_date
        .as_deref()
        .map(parse_date_bound)
        .transpose()?;

    if let Some(after) = after {
        if after >= before {
            return Err(ExportError::Validation(format!(
                "after date {} must be earlier than before date {}",
                after.format("%Y-%m-%d"),
                before.format("%Y-%m-%d")
            )));
        }
    }

    Ok((before, after))
}

async fn run_one(
    config: &NsExportConfig,
    client: &Arc<dyn RecordSource>,
    request: &FetchRequest,
    output_dir: &Path,
    shutdown_signal: watch::Receiver<bool>,
) -> TypeResult {
    let data_type = request.data_type;
    let reporter = Arc::new(TracingReporter::new(data_type.as_str()));
    let span = reporter.span();

    let run = ExportRun::new(client.clone(), reporter.clone())
        .with_policy(FetchPolicy::from_config(&config.source.retry))
        .with_anonymization(config.export.anonymize, config.export.anonymization_seed)
        .with_verification(config.verification.enable_verification)
        .with_cancellation(shutdown_signal);

    println!("📥 {data_type}: exporting...");
    match run.execute(request, output_dir).instrument(span).await {
        Ok(RunOutcome::Completed(summary)) => {
            if let Err(e) = write_metadata_sidecar(&summary.artifact) {
                tracing::error!(data_type = %data_type, error = %e, "Failed to write metadata");
                eprintln!("   ❌ {data_type}: failed to write metadata: {e}");
                return TypeResult::Failed;
            }

            println!("   ✅ {data_type}: {} records", summary.records_written);
            println!("      File: {}", summary.artifact.file_path.display());
            println!("      MD5: {}", summary.artifact.metadata.md5);
            println!("      Size: {} bytes", summary.artifact.size_bytes);
            println!("      Windows: {}", summary.windows_fetched);
            if summary.anonymized_values > 0 {
                println!("      Anonymized values: {}", summary.anonymized_values);
            }
            println!("      Duration: {:.2}s", summary.duration.as_secs_f64());
            if let Some(report) = &summary.verification {
                println!("      {}", report.format_summary().replace('\n', "\n      "));
            }
            TypeResult::Exported
        }
        Ok(RunOutcome::Cancelled {
            records_written,
            file_path,
        }) => {
            println!("   ⚠️  {data_type}: cancelled after {records_written} records");
            remove_partial(&file_path);
            TypeResult::Cancelled
        }
        Err(e) => {
            eprintln!("   ❌ {data_type}: {e}");
            if let Some(status) = reporter.last_status() {
                eprintln!("      Last status: {status}");
            }
            remove_partial(&output_dir.join(request.artifact_file_name()));
            TypeResult::Failed
        }
    }
}

/// Remove a partial artifact, if one was left behind
fn remove_partial(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "Removed partial artifact"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial artifact"),
    }
}
