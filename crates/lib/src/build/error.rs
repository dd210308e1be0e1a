use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::config::ConfigError;
use crate::error::ErrorKind;
use crate::util::hash::DigestError;

/// Failure of a single build step, or of constructing a build.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("command failed with {}: {cmd}", exit_status(.code))]
  ExecFailed { cmd: String, code: Option<i32> },

  #[error("no file written to {}", .0.display())]
  MissingArtifact(PathBuf),

  #[error("fetch failed for {url}: {message}")]
  SourceFetchFailed { url: String, message: String },

  #[error("source hash {source_hash} differs from revision {revision}; a dirty worktree cannot be fetched remotely")]
  DirtySourceUnverifiable { revision: String, source_hash: String },

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Digest(#[from] DigestError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("cancelled")]
  Cancelled,
}

fn exit_status(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {code}"),
    None => "no exit code (killed by signal)".to_string(),
  }
}

impl BuildError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Config(e) => e.kind(),
      Self::InvalidInput(_) => ErrorKind::InvalidInput,
      Self::ExecFailed { .. } => ErrorKind::ExecFailed,
      Self::MissingArtifact(_) => ErrorKind::MissingArtifact,
      Self::SourceFetchFailed { .. } => ErrorKind::SourceFetchFailed,
      Self::DirtySourceUnverifiable { .. } => ErrorKind::DirtySourceUnverifiable,
      Self::Archive(e) => e.kind(),
      Self::Digest(e) => e.kind(),
      Self::Io(_) => ErrorKind::Io,
      Self::Cancelled => ErrorKind::Cancelled,
    }
  }
}
