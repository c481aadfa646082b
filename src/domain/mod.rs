//! Domain models and types for the exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Data types** ([`DataType`]) with their windowing constants
//! - **Run input** ([`FetchRequest`])
//! - **Run output** ([`OutputArtifact`], [`ArtifactMetadata`])
//! - **Error types** ([`ExportError`], [`SourceError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ExportError>`]:
//!
//! ```rust
//! use nightscout_export::domain::{parse_date_bound, Result};
//!
//! fn example() -> Result<()> {
//!     let before = parse_date_bound("2020-01-10")?;
//!     assert_eq!(before.format("%Y-%m-%d").to_string(), "2020-01-10");
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod data_type;
pub mod errors;
pub mod request;
pub mod result;

pub use artifact::{ArtifactMetadata, OutputArtifact};
pub use data_type::{BoundEncoding, DataType};
pub use errors::{ExportError, SourceError};
pub use request::{parse_date_bound, FetchRequest};
pub use result::Result;
