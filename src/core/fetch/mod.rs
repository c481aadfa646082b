//! Windowed fetching from the upstream source
//!
//! [`PaginatedFetcher`] drives a [`RecordSource`] through the window plan and
//! pushes each record into a [`RecordSink`] as it arrives. Nothing is
//! buffered beyond the records of the current window.

pub mod fetcher;
pub mod source;

pub use fetcher::{FetchOutcome, FetchPolicy, FetchState, PaginatedFetcher, Termination};
pub use source::{records_from_payload, RecordSink, RecordSource};
