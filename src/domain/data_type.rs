//! Nightscout data types and their query characteristics
//!
//! Each data type carries the constants that drive windowed extraction:
//! chunk size, hard floor date, empty-run threshold, the field used for the
//! date predicate and the field holding identifying operator data.

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chunk used for entries, in milliseconds (~57.9 days)
pub const ENTRIES_CHUNK_MS: i64 = 5_000_000_000;

/// How a window bound is encoded in the upstream query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundEncoding {
    /// Numeric epoch milliseconds compared against `field`
    EpochMillis { field: &'static str },
    /// ISO-8601 string compared against `field`
    Iso8601 { field: &'static str },
}

impl BoundEncoding {
    /// Name of the document field the predicate applies to
    pub fn field(&self) -> &'static str {
        match self {
            BoundEncoding::EpochMillis { field } | BoundEncoding::Iso8601 { field } => field,
        }
    }
}

/// A Nightscout collection that can be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Sensor glucose entries
    Entries,
    /// Pump/loop device status reports
    DeviceStatus,
    /// Care portal treatments
    Treatments,
    /// Therapy profiles
    Profile,
}

impl DataType {
    /// All data types, in default export order
    pub const ALL: [DataType; 4] = [
        DataType::Entries,
        DataType::Treatments,
        DataType::DeviceStatus,
        DataType::Profile,
    ];

    /// Collection name as used by the upstream API
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Entries => "entries",
            DataType::DeviceStatus => "devicestatus",
            DataType::Treatments => "treatments",
            DataType::Profile => "profile",
        }
    }

    /// Path of the collection endpoint relative to the source base URL
    pub fn endpoint_path(&self) -> String {
        format!("/api/v1/{}.json", self.as_str())
    }

    /// Whether the collection is fetched window by window
    pub fn is_paginated(&self) -> bool {
        !matches!(self, DataType::Profile)
    }

    /// Width of one query window
    pub fn chunk(&self) -> Option<Duration> {
        match self {
            DataType::Entries => Some(Duration::milliseconds(ENTRIES_CHUNK_MS)),
            DataType::DeviceStatus => Some(Duration::days(2)),
            DataType::Treatments => Some(Duration::days(20)),
            DataType::Profile => None,
        }
    }

    /// Earliest date queried when the caller gives no lower bound
    pub fn hard_floor(&self) -> Option<DateTime<Utc>> {
        let (year, month, day) = match self {
            DataType::Entries => (2010, 1, 1),
            DataType::DeviceStatus => (2014, 10, 1),
            DataType::Treatments => (2012, 1, 1),
            DataType::Profile => return None,
        };
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Number of consecutive empty windows tolerated before the fetch stops
    pub fn empty_run_threshold(&self) -> Option<u32> {
        match self {
            DataType::Entries => Some(6),
            DataType::DeviceStatus => Some(40),
            DataType::Treatments => Some(15),
            DataType::Profile => None,
        }
    }

    /// Field replaced by an anonymization token, if any
    pub fn sensitive_field(&self) -> Option<&'static str> {
        match self {
            DataType::DeviceStatus => Some("device"),
            DataType::Treatments => Some("enteredBy"),
            DataType::Entries | DataType::Profile => None,
        }
    }

    /// Encoding of window bounds in query predicates
    pub fn bound_encoding(&self) -> Option<BoundEncoding> {
        match self {
            DataType::Entries => Some(BoundEncoding::EpochMillis { field: "date" }),
            DataType::DeviceStatus | DataType::Treatments => {
                Some(BoundEncoding::Iso8601 { field: "created_at" })
            }
            DataType::Profile => None,
        }
    }

    /// Upper bound of the first window for a caller-supplied `before` date
    ///
    /// Entries are queried at second precision, so the ceiling is the start
    /// of the second. ISO-encoded collections keep millisecond precision and
    /// use the last millisecond of that second.
    pub fn ceiling_of(&self, before: DateTime<Utc>) -> DateTime<Utc> {
        let second = before.trunc_subsecs(0);
        match self.bound_encoding() {
            Some(BoundEncoding::Iso8601 { .. }) => second + Duration::milliseconds(999),
            _ => second,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entries" => Ok(DataType::Entries),
            "devicestatus" => Ok(DataType::DeviceStatus),
            "treatments" => Ok(DataType::Treatments),
            "profile" => Ok(DataType::Profile),
            other => Err(format!(
                "Unknown data type '{other}'. Must be one of: entries, devicestatus, treatments, profile"
            )),
        }
    }
}
