//! On-disk locations derived from the tool identity, build kind, and source hash.
//!
//! Layout under the temp root:
//! `<tool>/<version>/<revision>/<primary|verification>/cache/{buildresult,source,sourcearchive}/<source-hash>`

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{Config, Tool};

/// Which side of a verification a build is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
  Primary,
  Verification,
}

impl BuildKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Primary => "primary",
      Self::Verification => "verification",
    }
  }
}

impl fmt::Display for BuildKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocator {
  temp_root: PathBuf,
  tool: Tool,
}

impl CacheLocator {
  pub fn new(temp_root: impl Into<PathBuf>, tool: Tool) -> Self {
    Self {
      temp_root: temp_root.into(),
      tool,
    }
  }

  /// Rooted at the OS temp directory.
  pub fn from_temp_dir(tool: Tool) -> Self {
    Self::new(std::env::temp_dir(), tool)
  }

  pub fn for_config(temp_root: impl Into<PathBuf>, config: &Config) -> Self {
    Self::new(temp_root, config.tool.clone())
  }

  pub fn temp_root(&self) -> &Path {
    &self.temp_root
  }

  pub fn tool(&self) -> &Tool {
    &self.tool
  }

  /// `<temp>/<tool>/<version>/<revision>/<kind>`
  pub fn kind_root(&self, kind: BuildKind) -> PathBuf {
    self
      .temp_root
      .join(&self.tool.name)
      .join(&self.tool.version)
      .join(&self.tool.revision)
      .join(kind.as_str())
  }

  fn cache_path(&self, kind: BuildKind, bucket: &str, source_hash: &str) -> PathBuf {
    self.kind_root(kind).join("cache").join(bucket).join(source_hash)
  }

  /// Where the JSON result of a build is persisted.
  pub fn build_result_path(&self, kind: BuildKind, source_hash: &str) -> PathBuf {
    self.cache_path(kind, "buildresult", source_hash)
  }

  /// Work dir of a remote build: the unpacked source tree.
  pub fn source_path(&self, kind: BuildKind, source_hash: &str) -> PathBuf {
    self.cache_path(kind, "source", source_hash)
  }

  /// Download and extraction directory for a remote source archive.
  pub fn source_archive_path(&self, kind: BuildKind, source_hash: &str) -> PathBuf {
    self.cache_path(kind, "sourcearchive", source_hash)
  }

  /// Default root of a local verification build.
  pub fn verification_root(&self, source_hash: &str) -> PathBuf {
    self.kind_root(BuildKind::Verification).join("root").join(source_hash)
  }
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;
  use crate::util::testutil::tool;

  #[test]
  fn build_result_path_layout() {
    let locator = CacheLocator::new("/tmp", tool());
    assert_eq!(
      locator.build_result_path(BuildKind::Primary, "cabba9e"),
      PathBuf::from("/tmp/repro/0.0.0-test/deadbeef/primary/cache/buildresult/cabba9e")
    );
    assert_eq!(
      locator.source_path(BuildKind::Verification, "cabba9e"),
      PathBuf::from("/tmp/repro/0.0.0-test/deadbeef/verification/cache/source/cabba9e")
    );
    assert_eq!(
      locator.source_archive_path(BuildKind::Verification, "cabba9e"),
      PathBuf::from("/tmp/repro/0.0.0-test/deadbeef/verification/cache/sourcearchive/cabba9e")
    );
  }

  #[test]
  fn kinds_and_hashes_do_not_alias() {
    let locator = CacheLocator::new("/tmp", tool());
    let primary = locator.build_result_path(BuildKind::Primary, "a");
    assert_ne!(primary, locator.build_result_path(BuildKind::Verification, "a"));
    assert_ne!(primary, locator.build_result_path(BuildKind::Primary, "b"));

    let other_tool = CacheLocator::new("/tmp", Tool::new("repro", "0.0.0-test", "f00d"));
    assert_ne!(primary, other_tool.build_result_path(BuildKind::Primary, "a"));
  }

  #[test]
  fn verification_root_is_outside_the_cache() {
    let locator = CacheLocator::new("/tmp", tool());
    let root = locator.verification_root("cabba9e");
    assert_eq!(
      root,
      PathBuf::from("/tmp/repro/0.0.0-test/deadbeef/verification/root/cabba9e")
    );
    assert!(!root.starts_with(locator.kind_root(BuildKind::Verification).join("cache")));
  }

  #[test]
  fn kind_display() {
    assert_eq!(BuildKind::Primary.to_string(), "primary");
    assert_eq!(
      serde_json::to_string(&BuildKind::Verification).unwrap(),
      "\"verification\""
    );
  }
}
