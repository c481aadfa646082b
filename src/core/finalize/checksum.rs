//! Block-wise file digests
//!
//! MD5 is what the upload side expects in artifact metadata. SHA-256 is
//! computed in the same pass and only used for local verification.

use crate::domain::{ExportError, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Size of the blocks the file is read in
pub const BLOCK_SIZE: usize = 4096;

/// Digests and size of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    /// Hex MD5
    pub md5: String,

    /// Hex SHA-256
    pub sha256: String,

    /// Bytes read
    pub size_bytes: u64,
}

/// Digest everything `reader` yields, [`BLOCK_SIZE`] bytes at a time
pub fn digest_reader<R: Read>(mut reader: R) -> std::io::Result<FileDigest> {
    let mut md5 = md5::Context::new();
    let mut sha256 = Sha256::new();
    let mut size_bytes = 0u64;
    let mut buffer = [0u8; BLOCK_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        md5.consume(&buffer[..n]);
        sha256.update(&buffer[..n]);
        size_bytes += n as u64;
    }

    Ok(FileDigest {
        md5: format!("{:x}", md5.finalize()),
        sha256: format!("{:x}", sha256.finalize()),
        size_bytes,
    })
}

/// Digest the file at `path`
pub fn digest_file(path: impl AsRef<Path>) -> Result<FileDigest> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ExportError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    digest_reader(file)
        .map_err(|e| ExportError::Io(format!("Failed to read {}: {}", path.display(), e)))
}

/// Digest the file at `path` on the blocking thread pool
pub async fn digest_file_blocking(path: PathBuf) -> Result<FileDigest> {
    tokio::task::spawn_blocking(move || digest_file(&path))
        .await
        .map_err(|e| ExportError::Other(format!("Digest task failed: {e}")))?
}
