//! Streaming gzip JSON packaging
//!
//! Records are written one at a time through a gzip encoder, so memory use
//! stays flat no matter how many windows a run spans.

pub mod streaming;

pub use streaming::{is_empty_payload, PayloadShape, StreamingPackager};
