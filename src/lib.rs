// nsexport - Nightscout windowed export tool
// Copyright (c) 2025 Nightscout Export Contributors
// Licensed under the MIT License

//! # nsexport - Nightscout windowed export
//!
//! nsexport pulls time-series collections (glucose entries, treatments,
//! device status reports and therapy profiles) from a Nightscout site and
//! writes each one to a single gzip-compressed JSON array, together with an
//! MD5 checksum and a small metadata record for downstream upload.
//!
//! ## Overview
//!
//! Each export run:
//! - **Plans** descending time windows from the requested `before` date down
//!   to the `after` date or the collection's hard floor
//! - **Fetches** every window with bounded retries, stopping early after a
//!   long run of empty windows
//! - **Anonymizes** identifying fields with run-scoped random tokens
//! - **Packages** records as they arrive into a streaming gzip writer
//! - **Finalizes** the artifact with its checksum and metadata
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export pipeline (plan, fetch, package, finalize, verification)
//! - [`adapters`] - Nightscout REST client and URL normalization
//! - [`anonymization`] - Field tokenization
//! - [`domain`] - Data types, requests, artifacts and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and run-scoped progress reporting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nightscout_export::adapters::nightscout::{normalize_url, NightscoutClient};
//! use nightscout_export::config::load_config;
//! use nightscout_export::core::export::ExportRun;
//! use nightscout_export::domain::{parse_date_bound, DataType, FetchRequest};
//! use nightscout_export::logging::TracingReporter;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("nsexport.toml")?;
//!     let base_url = normalize_url(&config.source.base_url, &config.source).await?;
//!     let client = Arc::new(NightscoutClient::new(base_url.clone(), &config.source)?);
//!
//!     let request = FetchRequest::new(
//!         DataType::Entries,
//!         base_url,
//!         parse_date_bound("2020-01-10")?,
//!         Some(parse_date_bound("2020-01-01")?),
//!     )?;
//!
//!     let run = ExportRun::new(client, Arc::new(TracingReporter::new("entries")));
//!     let outcome = run.execute(&request, Path::new("./out")).await?;
//!
//!     if let Some(summary) = outcome.summary() {
//!         println!("Wrote {} records, md5 {}", summary.records_written, summary.artifact.metadata.md5);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`], whose error type
//! [`domain::ExportError`] distinguishes configuration, source, retry
//! exhaustion and I/O failures. Source failures carry a [`domain::SourceError`]
//! that knows whether it is worth retrying.
//!
//! ## Logging
//!
//! nsexport uses structured logging with the `tracing` crate. Every run
//! reports through its own [`logging::ProgressReporter`], tagged with a run id.

pub mod adapters;
pub mod anonymization;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
