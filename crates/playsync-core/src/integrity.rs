//! File digests for copy verification and duplicate detection.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use md5::{Digest, Md5};

use crate::error::{FileSystemError, Result};

/// Read buffer size used while hashing.
pub const HASH_CHUNK_SIZE: usize = 4096;

/// Compute the MD5 digest of a file as 32 lowercase hex characters.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn file_hash(path: &Path) -> Result<String> {
    let read_failed = |e: std::io::Error| FileSystemError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let file = File::open(path).map_err(read_failed)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(read_failed)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Check that `destination` has the same content as `source`.
///
/// # Errors
///
/// Returns [`FileSystemError::ChecksumMismatch`] if the digests differ, or a
/// read error if either file cannot be hashed.
pub fn verify_copy(source: &Path, destination: &Path) -> Result<()> {
    if file_hash(source)? == file_hash(destination)? {
        Ok(())
    } else {
        Err(FileSystemError::ChecksumMismatch {
            path: destination.to_path_buf(),
        }
        .into())
    }
}
