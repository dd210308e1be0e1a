use thiserror::Error;

use crate::error::ErrorKind;
use crate::git::GitError;

/// Missing or unusable product, parameter, or path inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("missing required input: {0}")]
  Missing(&'static str),

  #[error("invalid {field}: {message}")]
  Invalid { field: &'static str, message: String },

  #[error("failed to inspect worktree: {0}")]
  Worktree(#[from] GitError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl ConfigError {
  pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
    Self::Invalid {
      field,
      message: message.into(),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Io(_) => ErrorKind::Io,
      _ => ErrorKind::InvalidInput,
    }
  }
}
