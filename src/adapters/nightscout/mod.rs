//! Nightscout REST API integration
//!
//! - [`client`] - [`RecordSource`](crate::core::fetch::RecordSource) over the v1 collection endpoints
//! - [`query`] - `count`, date predicate and token parameters
//! - [`url`] - Source URL normalization and reachability probe

pub mod client;
pub mod query;
pub mod url;

pub use client::{build_http_client, classify_transport_error, NightscoutClient};
pub use url::{normalize_url, origin_of};
