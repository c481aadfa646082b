//! Incremental JSON array writer over a gzip stream

use crate::core::fetch::RecordSink;
use crate::domain::{DataType, ExportError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level shape of the packaged document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `[record, record, ...]` built from any number of records
    Array,
    /// One payload written verbatim
    Single,
}

impl PayloadShape {
    /// Shape used for a collection
    pub fn for_data_type(data_type: DataType) -> Self {
        if data_type.is_paginated() {
            PayloadShape::Array
        } else {
            PayloadShape::Single
        }
    }
}

/// Whether a single payload carries no data
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

/// Writes records into a gzip-compressed JSON document
///
/// The document is only valid once [`close`](Self::close) returns. Dropping
/// the packager early leaves a truncated file that the caller must remove.
pub struct StreamingPackager<W: Write> {
    encoder: GzEncoder<W>,
    shape: PayloadShape,
    written: u64,
    payload_seen: bool,
}

impl StreamingPackager<BufWriter<File>> {
    /// Create `path` and open a packager on it
    pub fn create(path: impl AsRef<Path>, shape: PayloadShape) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            ExportError::Io(format!("Failed to create {}: {}", path.display(), e))
        })?;
        Self::new(BufWriter::new(file), shape)
    }
}

impl<W: Write> StreamingPackager<W> {
    /// Open a packager on `writer`
    pub fn new(writer: W, shape: PayloadShape) -> Result<Self> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        if shape == PayloadShape::Array {
            encoder.write_all(b"[")?;
        }
        Ok(Self {
            encoder,
            shape,
            written: 0,
            payload_seen: false,
        })
    }

    /// Append one record
    ///
    /// # Errors
    ///
    /// Fails on encoding or I/O errors, and on a second write in
    /// [`PayloadShape::Single`] mode.
    pub fn write_record(&mut self, record: &Value) -> Result<()> {
        match self.shape {
            PayloadShape::Array => {
                if self.written > 0 {
                    self.encoder.write_all(b",")?;
                }
                serde_json::to_writer(&mut self.encoder, record)?;
                self.written += 1;
            }
            PayloadShape::Single => {
                if self.payload_seen {
                    return Err(ExportError::Serialization(
                        "single payload already written".to_string(),
                    ));
                }
                self.payload_seen = true;
                if is_empty_payload(record) {
                    self.encoder.write_all(b"[]")?;
                } else {
                    serde_json::to_writer(&mut self.encoder, record)?;
                    self.written += 1;
                }
            }
        }
        Ok(())
    }

    /// Records written so far; an empty single payload counts as none
    pub fn records_written(&self) -> u64 {
        self.written
    }

    /// Terminate the document, finish the gzip stream and flush the sink
    pub fn close(mut self) -> Result<W> {
        match self.shape {
            PayloadShape::Array => self.encoder.write_all(b"]")?,
            PayloadShape::Single if !self.payload_seen => self.encoder.write_all(b"[]")?,
            PayloadShape::Single => {}
        }
        let mut inner = self.encoder.finish()?;
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> RecordSink for StreamingPackager<W> {
    fn accept(&mut self, record: Value) -> Result<()> {
        self.write_record(&record)
    }
}
