//! Cached build results.
//!
//! A [`Manager`] wraps one build. Results are stored as JSON under the cache
//! locator's `buildresult` directory, keyed by build kind and source hash.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::build::{Build, BuildResult, ResultFileError, result};
use crate::cache::CacheLocator;
use crate::error::ErrorKind;

#[derive(Debug, Error)]
pub enum ManagerError {
  #[error("failed to read cached result {}: {source}", path.display())]
  CacheRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cached result {} is corrupt: {source}", path.display())]
  CacheCorrupt {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write cached result {}: {source}", path.display())]
  CacheWrite {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl ManagerError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::CacheCorrupt { .. } => ErrorKind::CacheCorrupt,
      Self::CacheRead { .. } | Self::CacheWrite { .. } => ErrorKind::Io,
    }
  }
}

impl From<ResultFileError> for ManagerError {
  fn from(err: ResultFileError) -> Self {
    match err {
      ResultFileError::Read { path, source } => Self::CacheRead { path, source },
      ResultFileError::Parse { path, source } => Self::CacheCorrupt { path, source },
      ResultFileError::Write { path, source } => Self::CacheWrite { path, source },
    }
  }
}

#[derive(Debug, Clone)]
pub struct Manager {
  build: Build,
  locator: CacheLocator,
}

impl Manager {
  /// Cache under `temp_root`, namespaced by the build's tool identity.
  pub fn new(build: impl Into<Build>, temp_root: impl Into<PathBuf>) -> Self {
    let build = build.into();
    let locator = CacheLocator::for_config(temp_root, build.config());
    Self { build, locator }
  }

  pub fn with_locator(build: impl Into<Build>, locator: CacheLocator) -> Self {
    Self {
      build: build.into(),
      locator,
    }
  }

  pub fn build(&self) -> &Build {
    &self.build
  }

  pub fn cache_path(&self) -> PathBuf {
    self
      .locator
      .build_result_path(self.build.kind(), &self.build.config().product.source_hash)
  }

  /// The cached result, if one exists.
  ///
  /// A hit is returned as stored, failed builds included. A hit whose
  /// product or parameters differ from this build's is logged.
  pub fn cached_result(&self) -> Result<Option<BuildResult>, ManagerError> {
    let path = self.cache_path();
    let data = match std::fs::read(&path) {
      Ok(data) => data,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no cached result");
        return Ok(None);
      }
      Err(source) => return Err(ManagerError::CacheRead { path, source }),
    };

    let cached = BuildResult::from_json(&path, &data)?;
    let config = self.build.config();
    if cached.config.product != config.product || cached.config.parameters != config.parameters {
      warn!(path = %path.display(), "cached result has different inputs");
    }

    debug!(path = %path.display(), successful = cached.successful, "using cached result");
    Ok(Some(cached))
  }

  /// The cached result unless a rebuild is forced; otherwise run the build
  /// and persist its result.
  ///
  /// A failed build is returned (and cached) as a result with its error
  /// message set; only cache I/O surfaces as an error.
  pub async fn result(&self) -> Result<BuildResult, ManagerError> {
    if self.build.settings().force_rebuild() {
      debug!("rebuild forced, skipping cache");
    } else if let Some(cached) = self.cached_result()? {
      info!(kind = %self.build.kind(), "using cached build result");
      return Ok(cached);
    }

    let built = self.build.run().await;
    let path = self.cache_path();
    result::write_json(&path, &built)?;
    debug!(path = %path.display(), successful = built.successful, "cached build result");
    Ok(built)
  }
}
