//! Verification by rebuilding a copy of the primary tree on this host.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use super::step::{CORE_STEPS, Step};
use super::{BuildError, Settings};
use crate::config::Config;
use crate::consts::{META_DIR_NAME, TARGET_DIR_NAME, ZIP_DIR_NAME};
use crate::util::fs::{copy_tree, remove_dir_all};

#[derive(Debug, Clone)]
pub struct LocalVerification {
  config: Config,
  settings: Settings,
  primary_root: PathBuf,
  start_after: DateTime<Utc>,
}

impl LocalVerification {
  /// `config` must be rooted at the verification root, which is deleted and
  /// recreated. The instructions do not start before `start_after`.
  pub fn new(
    config: Config,
    primary_root: impl Into<PathBuf>,
    start_after: DateTime<Utc>,
    settings: Settings,
  ) -> Result<Self, BuildError> {
    let primary_root = primary_root.into();
    let work_dir = &config.paths.work_dir;
    if work_dir.starts_with(&primary_root) || primary_root.starts_with(work_dir) {
      return Err(BuildError::InvalidInput(format!(
        "verification root {} overlaps primary root {}",
        work_dir.display(),
        primary_root.display()
      )));
    }

    Ok(Self {
      config,
      settings,
      primary_root,
      start_after,
    })
  }

  /// Verify the build described by `primary`, rooted at `verification_root`.
  ///
  /// The deadline is `primary_start + stagger` when the primary start is
  /// known and `now + stagger` otherwise.
  pub fn for_primary(
    primary: &Config,
    verification_root: impl Into<PathBuf>,
    primary_start: Option<DateTime<Utc>>,
    stagger: Duration,
    settings: Settings,
  ) -> Result<Self, BuildError> {
    let config = primary.with_work_dir(verification_root)?;
    let start_after = start_after(primary_start, stagger);
    Self::new(config, primary.paths.work_dir.clone(), start_after, settings)
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn start_after(&self) -> DateTime<Utc> {
    self.start_after
  }

  pub fn steps(&self) -> Vec<Step> {
    let mut steps = vec![
      Step::RemoveWorkDir,
      Step::CopyPrimaryRoot {
        from: self.primary_root.clone(),
      },
      Step::WaitUntil {
        deadline: self.start_after,
      },
    ];
    steps.extend(CORE_STEPS);
    steps
  }
}

pub fn start_after(primary_start: Option<DateTime<Utc>>, stagger: Duration) -> DateTime<Utc> {
  let stagger = chrono::Duration::from_std(stagger).unwrap_or(chrono::Duration::MAX);
  let base = primary_start.unwrap_or_else(Utc::now);
  base.checked_add_signed(stagger).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub(crate) fn remove_work_dir(config: &Config) -> Result<(), BuildError> {
  remove_dir_all(&config.paths.work_dir)?;
  Ok(())
}

/// Copy the primary tree, leaving out the primary's own outputs.
pub(crate) fn copy_primary_root(from: &Path, config: &Config) -> Result<(), BuildError> {
  let copied = copy_tree(from, &config.paths.work_dir, &[TARGET_DIR_NAME, ZIP_DIR_NAME, META_DIR_NAME])?;
  info!(from = %from.display(), files = copied, "copied primary tree");
  Ok(())
}

pub(crate) async fn wait_until(deadline: DateTime<Utc>, settings: &Settings) -> Result<(), BuildError> {
  let Ok(remaining) = (deadline - Utc::now()).to_std() else {
    return Ok(());
  };
  if remaining.is_zero() {
    return Ok(());
  }

  info!(wait = ?remaining, "waiting for stagger");
  tokio::select! {
    _ = tokio::time::sleep(remaining) => Ok(()),
    _ = settings.cancel_token().cancelled() => Err(BuildError::Cancelled),
  }
}
