//! Source and sink seams of the fetch loop

use crate::core::plan::Window;
use crate::domain::{DataType, Result, SourceError};
use async_trait::async_trait;
use serde_json::Value;

/// Upstream collection that answers bounded date-range queries
///
/// Implementations issue exactly one request per call and never retry;
/// retry policy belongs to the fetcher.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the records of `data_type` whose date falls in `window`
    async fn fetch_window(
        &self,
        data_type: DataType,
        window: &Window,
    ) -> std::result::Result<Vec<Value>, SourceError>;

    /// Fetch a non-paginated collection in a single request
    async fn fetch_single(&self, data_type: DataType) -> std::result::Result<Value, SourceError>;

    /// Base URL the source talks to
    fn base_url(&self) -> &str;
}

/// Consumer of fetched records, in API order
pub trait RecordSink {
    /// Accept one record
    fn accept(&mut self, record: Value) -> Result<()>;
}

impl RecordSink for Vec<Value> {
    fn accept(&mut self, record: Value) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Interpret the body of a paginated response
///
/// A JSON array yields its elements and `null` counts as an empty window.
/// Anything else is malformed for a paginated endpoint.
pub fn records_from_payload(payload: Value) -> std::result::Result<Vec<Value>, SourceError> {
    match payload {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        other => Err(SourceError::MalformedResponse(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
