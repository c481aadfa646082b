//! Record pipeline between the fetcher and the packager

use crate::anonymization::FieldAnonymizer;
use crate::core::fetch::RecordSink;
use crate::core::package::StreamingPackager;
use crate::domain::Result;
use serde_json::Value;
use std::io::Write;

/// Counters reported when the pipeline is closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Records written to the artifact
    pub records_written: u64,

    /// Distinct sensitive values replaced by tokens
    pub anonymized_values: usize,
}

/// Anonymizes each record, then hands it to the packager
pub struct PipelineSink<W: Write> {
    anonymizer: Option<FieldAnonymizer>,
    packager: StreamingPackager<W>,
}

impl<W: Write> PipelineSink<W> {
    /// Chain an optional anonymizer in front of `packager`
    pub fn new(packager: StreamingPackager<W>, anonymizer: Option<FieldAnonymizer>) -> Self {
        Self {
            anonymizer,
            packager,
        }
    }

    /// Close the packager and report what went through
    pub fn close(self) -> Result<PipelineStats> {
        let records_written = self.packager.records_written();
        self.packager.close()?;
        Ok(PipelineStats {
            records_written,
            anonymized_values: self
                .anonymizer
                .as_ref()
                .map(FieldAnonymizer::distinct_values)
                .unwrap_or(0),
        })
    }
}

impl<W: Write> RecordSink for PipelineSink<W> {
    fn accept(&mut self, mut record: Value) -> Result<()> {
        if let Some(anonymizer) = self.anonymizer.as_mut() {
            anonymizer.apply(&mut record);
        }
        self.packager.write_record(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::PayloadShape;
    use crate::domain::DataType;
    use serde_json::json;

    #[test]
    fn test_anonymizes_before_packaging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treatments.json.gz");
        let packager = StreamingPackager::create(&path, PayloadShape::Array).unwrap();
        let anonymizer = FieldAnonymizer::for_data_type(DataType::Treatments, Some(5));
        let mut sink = PipelineSink::new(packager, anonymizer);

        sink.accept(json!({"enteredBy": "alice", "carbs": 10})).unwrap();
        sink.accept(json!({"enteredBy": "alice", "carbs": 20})).unwrap();
        let stats = sink.close().unwrap();

        assert_eq!(stats.records_written, 2);
        assert_eq!(stats.anonymized_values, 1);

        let bytes = std::fs::read(&path).unwrap();
        let mut text = String::new();
        std::io::Read::read_to_string(&mut flate2::read::GzDecoder::new(&bytes[..]), &mut text)
            .unwrap();
        assert!(!text.contains("alice"));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["enteredBy"], parsed[1]["enteredBy"]);
    }

    #[test]
    fn test_without_anonymizer() {
        let packager = StreamingPackager::new(Vec::new(), PayloadShape::Array).unwrap();
        let mut sink = PipelineSink::new(packager, None);
        sink.accept(json!({"enteredBy": "alice"})).unwrap();

        let stats = sink.close().unwrap();
        assert_eq!(stats.records_written, 1);
        assert_eq!(stats.anonymized_values, 0);
    }
}
