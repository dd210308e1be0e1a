//! Error taxonomy shared by every module.
//!
//! Each module has its own `thiserror` enum; all of them map onto one
//! [`ErrorKind`] through a `kind()` method so callers can branch without
//! inspecting messages.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  InvalidInput,
  Io,
  ExecFailed,
  MissingArtifact,
  SourceFetchFailed,
  IllegalPath,
  DuplicateEntry,
  DirtySourceUnverifiable,
  CacheCorrupt,
  InputsDiverged,
  NameMismatch,
  SizeMismatch,
  DigestMismatch,
  PrimaryFailed,
  VerificationFailed,
  Cancelled,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::InvalidInput => "invalid input",
      Self::Io => "io error",
      Self::ExecFailed => "exec failed",
      Self::MissingArtifact => "missing artifact",
      Self::SourceFetchFailed => "source fetch failed",
      Self::IllegalPath => "illegal path",
      Self::DuplicateEntry => "duplicate entry",
      Self::DirtySourceUnverifiable => "dirty source unverifiable",
      Self::CacheCorrupt => "cache corrupt",
      Self::InputsDiverged => "inputs diverged",
      Self::NameMismatch => "name mismatch",
      Self::SizeMismatch => "size mismatch",
      Self::DigestMismatch => "digest mismatch",
      Self::PrimaryFailed => "primary failed",
      Self::VerificationFailed => "verification failed",
      Self::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
