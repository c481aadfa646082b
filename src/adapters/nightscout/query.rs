//! Query parameters for Nightscout collection endpoints

use crate::core::plan::Window;
use crate::domain::{BoundEncoding, DataType};
use chrono::{DateTime, SecondsFormat, Utc};

/// Encode one window bound the way the collection's date field expects it
pub fn encode_bound(encoding: BoundEncoding, instant: DateTime<Utc>) -> String {
    match encoding {
        BoundEncoding::EpochMillis { .. } => instant.timestamp_millis().to_string(),
        BoundEncoding::Iso8601 { .. } => instant.to_rfc3339_opts(SecondsFormat::AutoSi, false),
    }
}

/// Parameters for a window query: `count`, `field <= end`, `field > start`
pub fn window_params(
    data_type: DataType,
    window: &Window,
    record_count: u64,
    token: Option<&str>,
) -> Vec<(String, String)> {
    let mut params = base_params(record_count, token);

    if let Some(encoding) = data_type.bound_encoding() {
        let field = encoding.field();
        params.push((
            format!("find[{field}][$lte]"),
            encode_bound(encoding, window.end),
        ));
        params.push((
            format!("find[{field}][$gt]"),
            encode_bound(encoding, window.start),
        ));
    }

    params
}

/// Parameters for a single unbounded query
pub fn base_params(record_count: u64, token: Option<&str>) -> Vec<(String, String)> {
    let mut params = vec![("count".to_string(), record_count.to_string())];
    if let Some(token) = token {
        params.push(("token".to_string(), token.to_string()));
    }
    params
}
