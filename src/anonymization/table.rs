//! Run-scoped mapping from sensitive values to tokens

use super::token::TokenSource;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Original value to token, for the lifetime of one run
///
/// Entries are only ever added. A token is issued to at most one value.
#[derive(Debug, Default)]
pub struct AnonymizationTable {
    tokens: HashMap<String, String>,
    issued: HashSet<String>,
}

impl AnonymizationTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Token already assigned to `original`
    pub fn get(&self, original: &str) -> Option<&str> {
        self.tokens.get(original).map(String::as_str)
    }

    /// Token for `original`, drawing a fresh one from `source` on first sight
    pub fn token_for(&mut self, original: &str, source: &mut dyn TokenSource) -> String {
        if let Some(token) = self.tokens.get(original) {
            return token.clone();
        }

        let mut token = source.next_token();
        while self.issued.contains(&token) {
            token = source.next_token();
        }

        self.issued.insert(token.clone());
        self.tokens.insert(original.to_string(), token.clone());
        token
    }

    /// Number of distinct values seen
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no value has been tokenized yet
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Replace `field` in `record` with its run token
///
/// Records that are not objects, or that lack the field, pass through
/// unchanged. Returns whether a substitution happened.
pub fn substitute(
    record: &mut Value,
    field: &str,
    table: &mut AnonymizationTable,
    source: &mut dyn TokenSource,
) -> bool {
    let Some(fields) = record.as_object_mut() else {
        return false;
    };
    substitute_in(fields, field, table, source)
}

fn substitute_in(
    fields: &mut Map<String, Value>,
    field: &str,
    table: &mut AnonymizationTable,
    source: &mut dyn TokenSource,
) -> bool {
    let Some(value) = fields.get_mut(field) else {
        return false;
    };

    // JSON text keeps "1" and 1 apart
    let key = value.to_string();
    *value = Value::String(table.token_for(&key, source));
    true
}
