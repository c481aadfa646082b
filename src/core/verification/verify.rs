//! Artifact verification
//!
//! Re-reads a finalized artifact and checks that its digests still match
//! and that it decompresses to one well-formed JSON document.

use crate::core::finalize::digest_file;
use crate::core::verification::report::VerificationReport;
use crate::domain::{ExportError, OutputArtifact, Result};
use flate2::read::GzDecoder;
use serde::de::{self, Deserializer as _, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

/// Top-level shape of a decompressed document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// Array with this many elements
    Array(u64),
    /// Object
    Object,
    /// String, number, boolean or null
    Scalar,
}

struct ShapeVisitor;

impl<'de> Visitor<'de> for ShapeVisitor {
    type Value = DocumentShape;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> std::result::Result<Self::Value, E> {
        Ok(DocumentShape::Scalar)
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> std::result::Result<Self::Value, E> {
        Ok(DocumentShape::Scalar)
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> std::result::Result<Self::Value, E> {
        Ok(DocumentShape::Scalar)
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> std::result::Result<Self::Value, E> {
        Ok(DocumentShape::Scalar)
    }

    fn visit_str<E: de::Error>(self, _v: &str) -> std::result::Result<Self::Value, E> {
        Ok(DocumentShape::Scalar)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(DocumentShape::Scalar)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut count = 0u64;
        while seq.next_element::<IgnoredAny>()?.is_some() {
            count += 1;
        }
        Ok(DocumentShape::Array(count))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(DocumentShape::Object)
    }
}

/// Stream-parse a gzip JSON file without materializing it
///
/// # Errors
///
/// Returns a verification error when the file is not gzip, is not a single
/// JSON document, or has trailing data.
pub fn inspect_document(path: &Path) -> Result<DocumentShape> {
    let file = File::open(path)
        .map_err(|e| ExportError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(GzDecoder::new(BufReader::new(file)));

    let mut de = serde_json::Deserializer::from_reader(reader);
    let shape = (&mut de)
        .deserialize_any(ShapeVisitor)
        .map_err(|e| ExportError::Verification(format!("{}: {}", path.display(), e)))?;
    de.end()
        .map_err(|e| ExportError::Verification(format!("{}: {}", path.display(), e)))?;

    Ok(shape)
}

/// Checks finalized artifacts
#[derive(Debug, Default)]
pub struct Verifier {
    expected_records: Option<u64>,
}

impl Verifier {
    /// Create a verifier that checks digests and document validity
    pub fn new() -> Self {
        Self::default()
    }

    /// Additionally require the document to be an array of `count` records
    pub fn expect_records(mut self, count: u64) -> Self {
        self.expected_records = Some(count);
        self
    }

    /// Verify `artifact` and return a report
    ///
    /// Failed checks land in the report; only an unreadable file is an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nightscout_export::core::verification::Verifier;
    /// # fn example(artifact: &nightscout_export::domain::OutputArtifact) -> nightscout_export::domain::Result<()> {
    /// let report = Verifier::new().expect_records(3).verify_artifact(artifact)?;
    /// println!("{}", report.format_summary());
    /// # Ok(())
    /// # }
    /// ```
    pub fn verify_artifact(&self, artifact: &OutputArtifact) -> Result<VerificationReport> {
        let start = Instant::now();
        let mut report = VerificationReport::new(&artifact.file_path);

        tracing::info!(path = %artifact.file_path.display(), "Verifying artifact");

        let digest = digest_file(&artifact.file_path)?;
        report.compare("md5", &artifact.metadata.md5, &digest.md5);
        report.compare("sha256", &artifact.sha256, &digest.sha256);
        report.compare(
            "size_bytes",
            &artifact.size_bytes.to_string(),
            &digest.size_bytes.to_string(),
        );

        match inspect_document(&artifact.file_path) {
            Ok(shape) => {
                report.record_pass();
                if let DocumentShape::Array(count) = shape {
                    report.record_count = Some(count);
                }
                if let Some(expected) = self.expected_records {
                    let actual = match shape {
                        DocumentShape::Array(count) => count.to_string(),
                        DocumentShape::Object => "object".to_string(),
                        DocumentShape::Scalar => "scalar".to_string(),
                    };
                    report.compare("record_count", &expected.to_string(), &actual);
                }
            }
            Err(ExportError::Verification(reason)) => {
                report.record_failure("json", "valid JSON document", reason);
            }
            Err(e) => return Err(e),
        }

        report.set_duration(start.elapsed().as_millis() as u64);

        if report.is_success() {
            tracing::info!(passed = report.passed, "Artifact verified");
        } else {
            tracing::warn!(failed = report.failures.len(), "Artifact verification failed");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finalize::finalize_artifact;
    use crate::core::package::{PayloadShape, StreamingPackager};
    use crate::domain::{parse_date_bound, DataType, FetchRequest};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;

    fn request() -> FetchRequest {
        FetchRequest::new(
            DataType::Entries,
            "https://ns.example.com",
            parse_date_bound("2020-01-10").unwrap(),
            None,
        )
        .unwrap()
    }

    fn write_gzip(path: &Path, body: &[u8]) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        encoder.write_all(body).unwrap();
        encoder.finish().unwrap();
    }

    #[tokio::test]
    async fn test_packaged_artifact_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries_to_2020-01-10.json.gz");
        let mut packager = StreamingPackager::create(&path, PayloadShape::Array).unwrap();
        for sgv in [120, 118, 115] {
            packager.write_record(&json!({ "sgv": sgv })).unwrap();
        }
        packager.close().unwrap();

        let artifact = finalize_artifact(&request(), &path).await.unwrap();
        let report = Verifier::new().expect_records(3).verify_artifact(&artifact).unwrap();

        assert!(report.is_success(), "{}", report.format_summary());
        assert_eq!(report.record_count, Some(3));
    }

    #[tokio::test]
    async fn test_tampered_file_fails_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries_to_2020-01-10.json.gz");
        write_gzip(&path, b"[1,2]");
        let artifact = finalize_artifact(&request(), &path).await.unwrap();

        write_gzip(&path, b"[1,2,3]");
        let report = Verifier::new().verify_artifact(&artifact).unwrap();

        assert!(!report.is_success());
        assert!(report.failures.iter().any(|f| f.check == "md5"));
    }

    #[test]
    fn test_truncated_document_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json.gz");
        write_gzip(&path, b"[{\"sgv\":1},");

        assert!(matches!(
            inspect_document(&path),
            Err(ExportError::Verification(_))
        ));
    }

    #[test]
    fn test_trailing_data_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trailing.json.gz");
        write_gzip(&path, b"[1] [2]");

        assert!(inspect_document(&path).is_err());
    }

    #[test]
    fn test_object_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json.gz");
        write_gzip(&path, br#"{"defaultProfile":"Default","store":{"Default":{"dia":3}}}"#);

        assert_eq!(inspect_document(&path).unwrap(), DocumentShape::Object);
    }

    #[test]
    fn test_scalar_document_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let bodies: [&[u8]; 3] = [b"42", b"\"maintenance\"", b"true"];
        for body in bodies {
            let path = dir.path().join("scalar.json.gz");
            write_gzip(&path, body);
            assert_eq!(inspect_document(&path).unwrap(), DocumentShape::Scalar);
        }
    }

    #[tokio::test]
    async fn test_scalar_single_payload_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile_to_2020-01-10.json.gz");
        let mut packager = StreamingPackager::create(&path, PayloadShape::Single).unwrap();
        packager.write_record(&json!("no profile")).unwrap();
        packager.close().unwrap();

        let artifact = finalize_artifact(&request(), &path).await.unwrap();
        let report = Verifier::new().verify_artifact(&artifact).unwrap();

        assert!(report.is_success(), "{}", report.format_summary());
        assert!(report.record_count.is_none());
    }
}
