//! SHA-256 digests of files and byte strings.
//!
//! All digests are lowercase hex, 64 characters long.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::ErrorKind;

/// Digest of a zero-length input.
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[derive(Debug, Error)]
pub enum DigestError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl DigestError {
  pub fn kind(&self) -> ErrorKind {
    ErrorKind::Io
  }
}

/// Hash a file's contents without loading it into memory.
pub fn sha256_hex(path: &Path) -> Result<String, DigestError> {
  let read_err = |source| DigestError::Read {
    path: path.to_path_buf(),
    source,
  };

  let mut file = fs::File::open(path).map_err(read_err)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hex::encode(hasher.finalize()))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}

/// Returns true iff at least two paths were given and all of them have the same digest.
pub fn equal(paths: &[&Path]) -> Result<bool, DigestError> {
  if paths.len() < 2 {
    return Ok(false);
  }

  let first = sha256_hex(paths[0])?;
  for path in &paths[1..] {
    if sha256_hex(path)? != first {
      return Ok(false);
    }
  }
  Ok(true)
}
