//! Raw configuration inputs as read from the process environment.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Config, ConfigError, Parameters, Product, Tool, Version};
use crate::git;

/// Every input a run may take from the environment. Unset variables are
/// `None`; empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOptions {
  pub repository: Option<String>,
  pub name: Option<String>,
  pub version: Option<String>,
  pub version_meta: Option<String>,
  pub revision: Option<String>,
  pub revision_time: Option<String>,
  pub source_hash: Option<String>,
  pub go_version: Option<String>,
  pub os: Option<String>,
  pub arch: Option<String>,
  pub instructions: Option<String>,
  pub bin_name: Option<String>,
  pub zip_name: Option<String>,
  pub primary_build_root: Option<PathBuf>,
  pub verification_build_root: Option<PathBuf>,
}

impl ConfigOptions {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Read options through `lookup`, which maps a variable name to its value.
  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
    Self {
      repository: get("PRODUCT_REPOSITORY").or_else(|| get("GITHUB_REPOSITORY")),
      name: get("PRODUCT_NAME"),
      version: get("PRODUCT_VERSION"),
      version_meta: get("PRODUCT_VERSION_META"),
      revision: get("PRODUCT_REVISION"),
      revision_time: get("PRODUCT_REVISION_TIME"),
      source_hash: get("PRODUCT_SOURCE_HASH"),
      go_version: get("GO_VERSION"),
      os: get("OS"),
      arch: get("ARCH"),
      instructions: get("INSTRUCTIONS"),
      bin_name: get("BIN_NAME"),
      zip_name: get("ZIP_NAME"),
      primary_build_root: get("PRIMARY_BUILD_ROOT").map(PathBuf::from),
      verification_build_root: get("VERIFICATION_BUILD_ROOT").map(PathBuf::from),
    }
  }

  /// The primary build root as an absolute path; the current directory when unset.
  pub fn primary_root(&self) -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir()?;
    Ok(absolute(&cwd, self.primary_build_root.as_deref().unwrap_or(Path::new("."))))
  }

  /// Resolve the primary build config.
  ///
  /// Revision details not given explicitly are read from the git worktree at
  /// the primary root.
  pub fn into_config(self, tool: Tool) -> Result<Config, ConfigError> {
    let root = self.primary_root()?;

    let (revision, revision_time, source_hash) = match self.revision {
      Some(revision) => (
        revision,
        self.revision_time.unwrap_or_default(),
        self.source_hash.unwrap_or_default(),
      ),
      None => {
        let worktree = git::inspect(&root)?;
        debug!(
          revision = %worktree.revision,
          dirty = worktree.dirty_files.len(),
          "inspected worktree"
        );
        (
          worktree.revision,
          self.revision_time.unwrap_or(worktree.revision_time),
          self.source_hash.unwrap_or(worktree.source_hash),
        )
      }
    };

    let version = Version {
      full: self.version.unwrap_or_default(),
      meta: self.version_meta.unwrap_or_default(),
      ..Default::default()
    };
    let version = if !version.meta.is_empty() && !version.full.contains('+') {
      Version {
        core: version.full,
        full: String::new(),
        meta: version.meta,
      }
    } else {
      version
    };

    let product = Product {
      repository: self.repository.unwrap_or_default(),
      name: self.name.unwrap_or_default(),
      executable_name: self.bin_name.unwrap_or_default(),
      version,
      revision,
      revision_time,
      source_hash,
      ..Default::default()
    };
    let parameters = Parameters {
      go_version: self.go_version.unwrap_or_default(),
      os: self.os.unwrap_or_default(),
      arch: self.arch.unwrap_or_default(),
      zip_name: self.zip_name.unwrap_or_default(),
      instructions: self.instructions.unwrap_or_default(),
    };

    Config::new(product, parameters, root, tool)
  }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    cwd.join(path)
  };
  dunce::canonicalize(&joined).unwrap_or(joined)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn github_repository_is_a_fallback() {
    let opts = ConfigOptions::from_lookup(lookup(&[("GITHUB_REPOSITORY", "hashicorp/lockbox")]));
    assert_eq!(opts.repository.as_deref(), Some("hashicorp/lockbox"));

    let opts = ConfigOptions::from_lookup(lookup(&[
      ("GITHUB_REPOSITORY", "hashicorp/lockbox"),
      ("PRODUCT_REPOSITORY", "hashicorp/vault"),
    ]));
    assert_eq!(opts.repository.as_deref(), Some("hashicorp/vault"));
  }

  #[test]
  fn empty_values_are_unset() {
    let opts = ConfigOptions::from_lookup(lookup(&[("PRODUCT_NAME", ""), ("OS", "linux")]));
    assert_eq!(opts.name, None);
    assert_eq!(opts.os.as_deref(), Some("linux"));
  }

  #[test]
  fn explicit_revision_skips_git() {
    let dir = tempfile::tempdir().unwrap();
    let opts = ConfigOptions::from_lookup(lookup(&[
      ("PRODUCT_NAME", "lockbox"),
      ("PRODUCT_VERSION", "1.2.3"),
      ("PRODUCT_VERSION_META", "ent"),
      ("PRODUCT_REVISION", "cabba9e"),
      ("PRODUCT_REVISION_TIME", "2022-07-04T11:33:33Z"),
      ("OS", "linux"),
      ("ARCH", "amd64"),
      ("INSTRUCTIONS", "echo hi > \"$BIN_PATH\""),
      ("PRIMARY_BUILD_ROOT", dir.path().to_str().unwrap()),
    ]));

    let config = opts.into_config(Tool::new("repro", "0.0.0", "test")).unwrap();
    assert_eq!(config.product.version.full, "1.2.3+ent");
    assert_eq!(config.product.source_hash, "cabba9e");
    assert_eq!(config.parameters.zip_name, "lockbox_1.2.3+ent_linux_amd64.zip");
    assert_eq!(config.paths.work_dir, dunce::canonicalize(dir.path()).unwrap());
  }

  #[test]
  fn relative_roots_resolve_against_cwd() {
    let cwd = std::env::temp_dir();
    assert_eq!(absolute(&cwd, Path::new("does-not-exist-xyz")), cwd.join("does-not-exist-xyz"));
  }
}
