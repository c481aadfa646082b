//! Post-export verification of artifacts
//!
//! Optional second pass over a finalized artifact: digests are recomputed
//! and the document is stream-parsed to confirm it is well-formed JSON.

pub mod report;
pub mod verify;

pub use report::{VerificationFailure, VerificationReport};
pub use verify::{inspect_document, DocumentShape, Verifier};
