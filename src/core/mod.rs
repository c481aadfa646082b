//! Core extraction pipeline.
//!
//! # Modules
//!
//! - [`plan`] - Window planning between the floor and the `before` date
//! - [`fetch`] - Paginated fetching with retry and the empty-run stop
//! - [`package`] - Streaming gzip JSON output
//! - [`finalize`] - Checksums and artifact metadata
//! - [`verification`] - Optional re-read of finalized artifacts
//! - [`export`] - Run orchestration
//!
//! # Export Workflow
//!
//! 1. **Plan**: Lay out windows newest first, down to the floor date
//! 2. **Fetch**: Query each window, retrying failures and stopping early on long empty runs
//! 3. **Anonymize**: Replace identifying fields with run-scoped tokens
//! 4. **Package**: Stream records into a gzip-compressed JSON array
//! 5. **Finalize**: Compute MD5 and assemble metadata
//! 6. **Verify** (optional): Recompute digests and re-parse the artifact
//!
//! # Example
//!
//! ```rust,no_run
//! use nightscout_export::adapters::nightscout::NightscoutClient;
//! use nightscout_export::config::SourceConfig;
//! use nightscout_export::core::export::ExportRun;
//! use nightscout_export::core::fetch::RecordSource;
//! use nightscout_export::domain::{parse_date_bound, DataType, FetchRequest};
//! use nightscout_export::logging::TracingReporter;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SourceConfig::default();
//! let client = NightscoutClient::new("https://my-site.herokuapp.com", &config)?;
//!
//! let request = FetchRequest::new(
//!     DataType::Entries,
//!     client.base_url(),
//!     parse_date_bound("2020-01-10")?,
//!     Some(parse_date_bound("2020-01-01")?),
//! )?;
//!
//! let run = ExportRun::new(Arc::new(client), Arc::new(TracingReporter::new("entries")));
//! let outcome = run.execute(&request, Path::new("./out")).await?;
//!
//! if let Some(summary) = outcome.summary() {
//!     println!("Records: {}", summary.records_written);
//!     println!("MD5: {}", summary.artifact.metadata.md5);
//! }
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod fetch;
pub mod finalize;
pub mod package;
pub mod plan;
pub mod verification;
