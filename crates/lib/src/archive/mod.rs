//! Deterministic flat zip archives.
//!
//! The writer produces archives with no directory entries, no host-dependent
//! extra fields, and a fixed file mode, so the same entries in the same order
//! always yield the same bytes. The extractor refuses entries that would land
//! outside the destination directory.

mod extract;
mod writer;

pub use extract::{clean_path, extract};
pub use writer::{FlatZipWriter, zip_dir};

use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("duplicate archive entry: {0}")]
  DuplicateEntry(String),

  #[error("illegal file path in archive: {0}")]
  IllegalPath(String),

  #[error("invalid archive entry name: {0:?}")]
  InvalidName(String),

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl ArchiveError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::DuplicateEntry(_) => ErrorKind::DuplicateEntry,
      Self::IllegalPath(_) => ErrorKind::IllegalPath,
      Self::InvalidName(_) => ErrorKind::InvalidInput,
      Self::Read { .. } | Self::Zip(_) | Self::Io(_) => ErrorKind::Io,
    }
  }
}
