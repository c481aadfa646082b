//! Produced artifact and its descriptive metadata

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata handed to the upload collaborator next to the artifact file
///
/// `startDate` is omitted entirely when the run had no lower bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Free-form tags; always contains `json`
    pub tags: Vec<String>,

    /// Human readable description, e.g. `entries data`
    pub description: String,

    /// Hex MD5 of the compressed file
    pub md5: String,

    /// `before_date` as `YYYY-MM-DD`
    #[serde(rename = "endDate")]
    pub end_date: String,

    /// `after_date` as `YYYY-MM-DD`
    #[serde(rename = "startDate", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

/// The compressed output file plus its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// Location of the gzip file
    pub file_path: PathBuf,

    /// External metadata
    pub metadata: ArtifactMetadata,

    /// Hex SHA-256 of the compressed file, kept for internal verification
    pub sha256: String,

    /// Size of the compressed file in bytes
    pub size_bytes: u64,
}

impl OutputArtifact {
    /// Path of the metadata sidecar written next to the artifact
    pub fn metadata_path(&self) -> PathBuf {
        let mut name = self.file_path.as_os_str().to_owned();
        name.push(".metadata.json");
        PathBuf::from(name)
    }
}
