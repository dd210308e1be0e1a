//! Worktree inspection: revision, commit time, and the source hash.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use gix::bstr::BString;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::error::ErrorKind;

#[derive(Debug, Error)]
pub enum GitError {
  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::discover::Error>,
  },

  #[error("repository at '{0}' has no worktree")]
  Bare(PathBuf),

  #[error("failed to resolve HEAD: {0}")]
  ResolveHead(String),

  #[error("failed to read worktree status: {source}")]
  Status {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl GitError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Read { .. } => ErrorKind::Io,
      _ => ErrorKind::InvalidInput,
    }
  }

  fn status(source: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Status {
      source: Box::new(source),
    }
  }
}

/// State of a git worktree relevant to a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
  pub revision: String,
  /// Commit time, RFC3339 in UTC.
  pub revision_time: String,
  pub source_hash: String,
  /// Changed or untracked paths relative to the worktree root, sorted.
  pub dirty_files: Vec<String>,
}

impl Worktree {
  pub fn is_dirty(&self) -> bool {
    !self.dirty_files.is_empty()
  }
}

/// Inspect the worktree containing `dir`.
pub fn inspect(dir: &Path) -> Result<Worktree, GitError> {
  let repo = gix::discover(dir).map_err(|e| GitError::Open {
    path: dir.to_path_buf(),
    source: Box::new(e),
  })?;
  let top = repo
    .workdir()
    .map(Path::to_path_buf)
    .ok_or_else(|| GitError::Bare(dir.to_path_buf()))?;

  let commit = repo
    .head_commit()
    .map_err(|e| GitError::ResolveHead(e.to_string()))?;
  let revision = commit.id.to_string();
  let time = commit.time().map_err(|e| GitError::ResolveHead(e.to_string()))?;
  let revision_time = DateTime::<Utc>::from_timestamp(time.seconds, 0)
    .ok_or_else(|| GitError::ResolveHead(format!("commit time {} out of range", time.seconds)))?
    .to_rfc3339_opts(SecondsFormat::Secs, true);

  let dirty_files = dirty_files(&repo)?;
  debug!(revision = %revision, dirty = dirty_files.len(), "read worktree status");
  let source_hash = source_hash(&top, &revision, &dirty_files)?;

  Ok(Worktree {
    revision,
    revision_time,
    source_hash,
    dirty_files,
  })
}

/// Staged, unstaged and untracked paths, sorted and deduplicated.
///
/// Rename tracking is off, so a rename contributes both its old and new path.
fn dirty_files(repo: &gix::Repository) -> Result<Vec<String>, GitError> {
  let status = repo
    .status(gix::progress::Discard)
    .map_err(GitError::status)?
    .untracked_files(gix::status::UntrackedFiles::Files)
    .tree_index_track_renames(gix::status::tree_index::TrackRenames::Disabled)
    .into_iter(Vec::<BString>::new())
    .map_err(GitError::status)?;

  let mut paths = Vec::new();
  for item in status {
    let item = item.map_err(GitError::status)?;
    paths.push(item.location().to_string());
  }
  paths.sort();
  paths.dedup();
  Ok(paths)
}

/// `revision` for a clean tree; otherwise SHA-256 over the revision followed by
/// each path and its contents. Deleted files contribute their path only.
pub fn source_hash(root: &Path, revision: &str, dirty_files: &[String]) -> Result<String, GitError> {
  if dirty_files.is_empty() {
    return Ok(revision.to_string());
  }

  let mut sorted: Vec<&String> = dirty_files.iter().collect();
  sorted.sort();

  let mut hasher = Sha256::new();
  hasher.update(revision.as_bytes());
  let mut buffer = [0u8; 8192];
  for rel in sorted {
    hasher.update(rel.as_bytes());
    hasher.update([0u8]);

    let path = root.join(rel);
    if !path.is_file() {
      continue;
    }
    let mut file = std::fs::File::open(&path).map_err(|source| GitError::Read {
      path: path.clone(),
      source,
    })?;
    loop {
      let n = file.read(&mut buffer).map_err(|source| GitError::Read {
        path: path.clone(),
        source,
      })?;
      if n == 0 {
        break;
      }
      hasher.update(&buffer[..n]);
    }
  }
  Ok(hex::encode(hasher.finalize()))
}
