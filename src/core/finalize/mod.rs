//! Artifact finalization
//!
//! After the packager is closed the file is read back once to compute its
//! checksums, and the metadata handed to the upload side is assembled from
//! the run request.

pub mod checksum;

pub use checksum::{digest_file, digest_file_blocking, digest_reader, FileDigest, BLOCK_SIZE};

use crate::domain::{ArtifactMetadata, ExportError, FetchRequest, OutputArtifact, Result};
use std::path::{Path, PathBuf};

/// Build the external metadata for `request` given the file's MD5
pub fn build_metadata(request: &FetchRequest, md5: String) -> ArtifactMetadata {
    ArtifactMetadata {
        tags: vec!["json".to_string()],
        description: format!("{} data", request.data_type),
        md5,
        end_date: request.end_date_label(),
        start_date: request.start_date_label(),
    }
}

/// Digest the closed artifact at `path` and describe it
pub async fn finalize_artifact(request: &FetchRequest, path: &Path) -> Result<OutputArtifact> {
    let digest = digest_file_blocking(path.to_path_buf()).await?;

    tracing::debug!(
        path = %path.display(),
        md5 = %digest.md5,
        size_bytes = digest.size_bytes,
        "Artifact finalized"
    );

    Ok(OutputArtifact {
        file_path: path.to_path_buf(),
        metadata: build_metadata(request, digest.md5),
        sha256: digest.sha256,
        size_bytes: digest.size_bytes,
    })
}

/// Write `<artifact>.metadata.json` next to the artifact
pub fn write_metadata_sidecar(artifact: &OutputArtifact) -> Result<PathBuf> {
    let path = artifact.metadata_path();
    let json = serde_json::to_string_pretty(&artifact.metadata)?;
    std::fs::write(&path, json)
        .map_err(|e| ExportError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(path)
}
