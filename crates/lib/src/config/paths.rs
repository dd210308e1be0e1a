use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ConfigError, require_file_name};
use crate::consts::{META_DIR_NAME, TARGET_DIR_NAME, ZIP_DIR_NAME};

/// Host-specific locations of one build. These legitimately differ between
/// the primary and verification builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Paths {
  pub work_dir: PathBuf,
  pub target_dir: PathBuf,
  pub bin_path: PathBuf,
  pub zip_path: PathBuf,
  pub meta_dir: PathBuf,
}

impl Paths {
  /// Derive every path from the work dir.
  ///
  /// `work_dir` must be absolute; `executable` and `zip_name` must be plain
  /// file names so that both artifacts land under `work_dir`.
  pub fn new(work_dir: impl Into<PathBuf>, executable: &str, zip_name: &str) -> Result<Self, ConfigError> {
    let work_dir = work_dir.into();
    if !work_dir.is_absolute() {
      return Err(ConfigError::invalid(
        "work dir",
        format!("{} is not absolute", work_dir.display()),
      ));
    }
    require_file_name("executable name", executable)?;
    require_file_name("zip name", zip_name)?;

    let target_dir = work_dir.join(TARGET_DIR_NAME);
    Ok(Self {
      bin_path: target_dir.join(executable),
      zip_path: work_dir.join(ZIP_DIR_NAME).join(zip_name),
      meta_dir: work_dir.join(META_DIR_NAME),
      target_dir,
      work_dir,
    })
  }

  /// Directory holding the archive.
  pub fn zip_dir(&self) -> &Path {
    self.zip_path.parent().unwrap_or(&self.work_dir)
  }

  pub fn executable_file_name(&self) -> String {
    file_name(&self.bin_path)
  }

  pub fn zip_file_name(&self) -> String {
    file_name(&self.zip_path)
  }
}

/// Append `.exe` for Windows targets unless already present.
pub fn executable_name(name: &str, os: &str) -> String {
  if os == "windows" && !name.ends_with(".exe") {
    format!("{}.exe", name)
  } else {
    name.to_string()
  }
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default()
}
