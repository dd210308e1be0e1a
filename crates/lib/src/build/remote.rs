//! Verification by rebuilding from a source archive fetched from the repository host.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::step::{CORE_STEPS, Step};
use super::{BuildError, Settings, fetch};
use crate::archive;
use crate::cache::{BuildKind, CacheLocator};
use crate::config::Config;
use crate::consts::DEFAULT_SOURCE_HOST;
use crate::util::fs::{mkdir_all, remove_dir_all};

#[derive(Debug, Clone)]
pub struct RemoteBuild {
  config: Config,
  settings: Settings,
  host: String,
  download_dir: PathBuf,
}

impl RemoteBuild {
  /// Root `config` at the source cache for its source hash.
  ///
  /// A dirty worktree is refused: its source cannot be fetched by revision.
  pub fn new(config: &Config, locator: &CacheLocator, settings: Settings) -> Result<Self, BuildError> {
    let product = &config.product;
    if product.is_dirty() {
      return Err(BuildError::DirtySourceUnverifiable {
        revision: product.revision.clone(),
        source_hash: product.source_hash.clone(),
      });
    }
    if product.repository.is_empty() {
      return Err(BuildError::InvalidInput(
        "remote verification needs a product repository".to_string(),
      ));
    }

    let hash = &product.source_hash;
    let config = config.with_work_dir(locator.source_path(BuildKind::Verification, hash))?;
    Ok(Self {
      config,
      settings,
      host: DEFAULT_SOURCE_HOST.to_string(),
      download_dir: locator.source_archive_path(BuildKind::Verification, hash),
    })
  }

  /// Fetch from another host, e.g. `http://127.0.0.1:8080`.
  pub fn with_host(mut self, host: impl Into<String>) -> Self {
    self.host = host.into();
    self
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  /// `<host>/<repository>/archive/<revision>.zip`
  pub fn source_url(&self) -> String {
    format!(
      "{}/{}/archive/{}.zip",
      self.host.trim_end_matches('/'),
      self.config.product.repository,
      self.config.product.revision
    )
  }

  pub fn download_dir(&self) -> &Path {
    &self.download_dir
  }

  pub fn steps(&self) -> Vec<Step> {
    let url = self.source_url();
    let archive = self.download_dir.join(format!("{}.zip", self.config.product.revision));
    let mut steps = vec![
      Step::PrepareSourceDirs {
        download_dir: self.download_dir.clone(),
      },
      Step::FetchSource {
        url: url.clone(),
        dest: archive.clone(),
      },
      Step::ExtractSource {
        archive,
        dest: self.download_dir.clone(),
      },
      Step::MoveSourceIntoPlace {
        url,
        download_dir: self.download_dir.clone(),
      },
    ];
    steps.extend(CORE_STEPS);
    steps
  }
}

/// Start from an empty download dir and no work dir.
pub(crate) fn prepare_source_dirs(download_dir: &Path, config: &Config) -> Result<(), BuildError> {
  let work_dir = &config.paths.work_dir;
  remove_dir_all(download_dir)?;
  remove_dir_all(work_dir)?;
  mkdir_all(&[download_dir])?;
  if let Some(parent) = work_dir.parent() {
    mkdir_all(&[parent])?;
  }
  Ok(())
}

pub(crate) async fn fetch_source(url: &str, dest: &Path, settings: &Settings) -> Result<(), BuildError> {
  let size = fetch::download(url, dest, settings.cancel_token()).await?;
  info!(url = %url, size, "fetched source archive");
  Ok(())
}

/// Unpack next to the archive, then drop the archive itself.
pub(crate) fn extract_source(archive_path: &Path, dest: &Path) -> Result<(), BuildError> {
  archive::extract(archive_path, dest)?;
  std::fs::remove_file(archive_path)?;
  Ok(())
}

/// Hosts wrap the tree in a single `<repo>-<revision>` directory; that
/// directory becomes the work dir.
pub(crate) fn move_source_into_place(url: &str, download_dir: &Path, config: &Config) -> Result<(), BuildError> {
  let mut dirs = Vec::new();
  for entry in std::fs::read_dir(download_dir)? {
    let entry = entry?;
    if entry.file_type()?.is_dir() {
      dirs.push(entry.path());
    }
  }

  let [inner] = dirs.as_slice() else {
    return Err(BuildError::SourceFetchFailed {
      url: url.to_string(),
      message: format!("expected one top-level directory in the archive, found {}", dirs.len()),
    });
  };

  debug!(from = %inner.display(), to = %config.paths.work_dir.display(), "moving source");
  std::fs::rename(inner, &config.paths.work_dir)?;
  Ok(())
}
