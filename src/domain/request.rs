//! Run input
//!
//! A [`FetchRequest`] is the immutable description of one export run: which
//! collection to pull, from where, and between which dates.

use super::data_type::DataType;
use super::errors::ExportError;
use super::result::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Date format used in file names and artifact metadata
pub const METADATA_DATE_FORMAT: &str = "%Y-%m-%d";

/// Immutable input to a single export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Collection to export
    pub data_type: DataType,

    /// Normalized source URL (scheme and host only)
    pub source_base_url: String,

    /// Newest instant to export
    pub before_date: DateTime<Utc>,

    /// Optional lower bound; the data type's hard floor applies when absent
    pub after_date: Option<DateTime<Utc>>,
}

impl FetchRequest {
    /// Create a validated request
    ///
    /// # Errors
    ///
    /// Returns a validation error when the base URL is empty or when
    /// `after_date` is not earlier than `before_date`.
    pub fn new(
        data_type: DataType,
        source_base_url: impl Into<String>,
        before_date: DateTime<Utc>,
        after_date: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let source_base_url = source_base_url.into();
        if source_base_url.trim().is_empty() {
            return Err(ExportError::Validation(
                "source base URL cannot be empty".to_string(),
            ));
        }

        if let Some(after) = after_date {
            if after >= before_date {
                return Err(ExportError::Validation(format!(
                    "after date {} must be earlier than before date {}",
                    after.format(METADATA_DATE_FORMAT),
                    before_date.format(METADATA_DATE_FORMAT)
                )));
            }
        }

        Ok(Self {
            data_type,
            source_base_url: source_base_url.trim_end_matches('/').to_string(),
            before_date,
            after_date,
        })
    }

    /// `before_date` as `YYYY-MM-DD`
    pub fn end_date_label(&self) -> String {
        self.before_date.format(METADATA_DATE_FORMAT).to_string()
    }

    /// `after_date` as `YYYY-MM-DD`, when present
    pub fn start_date_label(&self) -> Option<String> {
        self.after_date
            .map(|after| after.format(METADATA_DATE_FORMAT).to_string())
    }

    /// File name of the artifact produced for this request
    pub fn artifact_file_name(&self) -> String {
        match self.start_date_label() {
            Some(start) => format!(
                "{}_{}_to_{}.json.gz",
                self.data_type,
                start,
                self.end_date_label()
            ),
            None => format!("{}_to_{}.json.gz", self.data_type, self.end_date_label()),
        }
    }
}

/// Parse a date bound given as `YYYY-MM-DD` (midnight UTC) or RFC 3339
///
/// # Errors
///
/// Returns a validation error when the input matches neither format.
pub fn parse_date_bound(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, METADATA_DATE_FORMAT) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ExportError::Validation(format!(
                "Invalid date '{input}': expected YYYY-MM-DD or RFC 3339 ({e})"
            ))
        })
}
