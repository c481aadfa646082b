//! Run-scoped anonymization of identifying fields
//!
//! Device status and treatment records carry an operator or device
//! identifier. Before a record reaches the packager its value is replaced
//! with a short token. Tokens are consistent within one run and the table
//! behind them is dropped with the run.
//!
//! # Usage
//!
//! ```rust
//! use nightscout_export::anonymization::FieldAnonymizer;
//! use nightscout_export::domain::DataType;
//! use serde_json::json;
//!
//! let mut anonymizer = FieldAnonymizer::for_data_type(DataType::Treatments, Some(42)).unwrap();
//! let mut record = json!({"enteredBy": "alice", "carbs": 30});
//! anonymizer.apply(&mut record);
//! assert_ne!(record["enteredBy"], "alice");
//! ```

pub mod anonymizer;
pub mod table;
pub mod token;

pub use anonymizer::FieldAnonymizer;
pub use table::{substitute, AnonymizationTable};
pub use token::{RandomTokenSource, TokenSource, TOKEN_ALPHABET, TOKEN_LENGTH};
