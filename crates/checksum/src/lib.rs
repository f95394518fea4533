//! Single-pass MD5/SHA-1 file digests.
//!
//! The repository deploy protocol identifies content by MD5 and SHA-1,
//! so both hashers are fed from one read of the file.

use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};
use sha1::Sha1;

/// Hex-encoded content digests of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checksums {
    pub md5: String,
    pub sha1: String,
}

/// Errors produced while hashing files.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Computes MD5 and SHA-1 of `path` in a single streaming pass.
///
/// Digests are lowercase hex.
pub fn compute(path: &Path) -> Result<Checksums, ChecksumError> {
    let mut file = std::fs::File::open(path)?;
    let mut md5 = Md5::new();
    let mut sha1 = Sha1::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        md5.update(&buf[..n]);
        sha1.update(&buf[..n]);
    }
    Ok(Checksums {
        md5: hex::encode(md5.finalize()),
        sha1: hex::encode(sha1.finalize()),
    })
}

/// Computes MD5 and SHA-1 of an in-memory buffer.
pub fn compute_bytes(data: &[u8]) -> Checksums {
    let mut md5 = Md5::new();
    let mut sha1 = Sha1::new();
    md5.update(data);
    sha1.update(data);
    Checksums {
        md5: hex::encode(md5.finalize()),
        sha1: hex::encode(sha1.finalize()),
    }
}
