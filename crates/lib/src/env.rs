//! The environment a build script sees.

use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::config::Config;

/// Whether a variable is identical across primary and verification builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvScope {
  Invariant,
  BuildSpecific,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
  pub name: &'static str,
  pub value: String,
  pub scope: EnvScope,
}

impl fmt::Display for EnvVar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}={}", self.name, self.value)
  }
}

/// Project `config` into the variables exported to the instructions, in a fixed order.
pub fn project(config: &Config) -> Vec<EnvVar> {
  use EnvScope::*;

  let product = &config.product;
  let params = &config.parameters;
  let paths = &config.paths;
  let var = |name: &'static str, value: String, scope: EnvScope| EnvVar { name, value, scope };

  vec![
    var("PRODUCT_NAME", product.name.clone(), Invariant),
    var("PRODUCT_VERSION", product.version.full.clone(), Invariant),
    var("PRODUCT_REVISION", product.revision.clone(), Invariant),
    var("PRODUCT_REVISION_TIME", product.revision_time.clone(), Invariant),
    var("OS", params.os.clone(), Invariant),
    var("ARCH", params.arch.clone(), Invariant),
    var("GOOS", params.os.clone(), Invariant),
    var("GOARCH", params.arch.clone(), Invariant),
    var("WORKTREE_DIRTY", product.is_dirty().to_string(), Invariant),
    var("WORKTREE_HASH", product.source_hash.clone(), Invariant),
    var("TARGET_DIR", paths.target_dir.display().to_string(), BuildSpecific),
    var("BIN_PATH", paths.bin_path.display().to_string(), BuildSpecific),
  ]
}

/// Only the variables that do not depend on host paths.
pub fn invariant(config: &Config) -> Vec<EnvVar> {
  project(config)
    .into_iter()
    .filter(|v| v.scope == EnvScope::Invariant)
    .collect()
}

/// `(name, value)` pairs ready for `Command::envs`.
pub fn pairs<'a>(vars: &'a [EnvVar]) -> impl Iterator<Item = (&'a str, &'a str)> {
  vars.iter().map(|v| -> (&'a str, &'a str) { (v.name, &v.value) })
}

/// Newline-delimited `NAME=VALUE` lines.
pub fn render(vars: &[EnvVar]) -> String {
  vars.iter().map(|v| format!("{}\n", v)).collect()
}

/// Append the rendered variables to `path`, creating it if needed.
pub fn append_to_file(path: &Path, vars: &[EnvVar]) -> std::io::Result<()> {
  let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
  file.write_all(render(vars).as_bytes())?;
  file.flush()
}

/// Append to the file named by `GITHUB_ENV`. Returns whether it was set.
pub fn append_to_github_env(vars: &[EnvVar]) -> std::io::Result<bool> {
  match std::env::var_os("GITHUB_ENV").filter(|v| !v.is_empty()) {
    Some(path) => {
      append_to_file(Path::new(&path), vars)?;
      Ok(true)
    }
    None => Ok(false),
  }
}
