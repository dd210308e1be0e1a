//! Steps every build variant shares, in the order they run.

use std::time::SystemTime;

use tempfile::TempPath;
use tracing::debug;

use super::{BuildError, Settings, exec};
use crate::archive::zip_dir;
use crate::config::Config;
use crate::env;
use crate::util::fs::{file_exists, mkdir_all, set_mtimes, write_temp_file};

pub(crate) fn validate_inputs(config: &Config) -> Result<(), BuildError> {
  config.product.revision_timestamp()?;
  if !config.paths.work_dir.is_absolute() {
    return Err(BuildError::InvalidInput(format!(
      "work dir {} is not absolute",
      config.paths.work_dir.display()
    )));
  }
  if config.parameters.instructions.trim().is_empty() {
    return Err(BuildError::InvalidInput("no instructions".to_string()));
  }
  Ok(())
}

pub(crate) fn create_output_dirs(config: &Config) -> Result<(), BuildError> {
  let paths = &config.paths;
  mkdir_all(&[paths.target_dir.as_path(), paths.zip_dir(), paths.meta_dir.as_path()])?;
  Ok(())
}

/// The returned path removes the script when dropped.
pub(crate) fn write_instructions(config: &Config) -> Result<TempPath, BuildError> {
  let script = write_temp_file("repro-instructions-", ".sh", config.parameters.instructions.as_bytes())?;
  debug!(path = %script.display(), "wrote instructions");
  Ok(script)
}

pub(crate) async fn run_instructions(
  config: &Config,
  settings: &Settings,
  script: Option<&TempPath>,
) -> Result<(), BuildError> {
  let Some(script) = script else {
    return Err(BuildError::InvalidInput("instructions were not written".to_string()));
  };
  let vars = env::project(config);
  exec::run_script(script, &config.paths.work_dir, env::pairs(&vars), settings).await
}

pub(crate) fn assert_executable_written(config: &Config) -> Result<(), BuildError> {
  let bin_path = &config.paths.bin_path;
  if file_exists(bin_path)? {
    Ok(())
  } else {
    Err(BuildError::MissingArtifact(bin_path.clone()))
  }
}

/// Stamp every file directly in the target dir with the revision time.
pub(crate) fn normalize_mtimes(config: &Config) -> Result<(), BuildError> {
  let stamp: SystemTime = config.product.revision_timestamp()?.into();
  set_mtimes(&config.paths.target_dir, stamp)?;
  Ok(())
}

/// Entries carry the revision time, including files nested below the target dir.
pub(crate) fn create_archive(config: &Config) -> Result<(), BuildError> {
  let stamp: SystemTime = config.product.revision_timestamp()?.into();
  zip_dir(&config.paths.target_dir, &config.paths.zip_path, stamp)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::lockbox_config;

  #[test]
  fn missing_executable_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = lockbox_config(dir.path(), "echo done");
    create_output_dirs(&config).unwrap();

    let err = assert_executable_written(&config).unwrap_err();
    assert!(err.to_string().contains("no file written"));
    assert_eq!(err.kind(), crate::ErrorKind::MissingArtifact);
  }

  #[test]
  fn directory_at_bin_path_is_not_an_executable() {
    let dir = tempfile::tempdir().unwrap();
    let config = lockbox_config(dir.path(), "true");
    std::fs::create_dir_all(&config.paths.bin_path).unwrap();
    assert!(assert_executable_written(&config).is_err());
  }

  #[test]
  fn unparsable_revision_time_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = lockbox_config(dir.path(), "true");
    config.product.revision_time = "not a time".to_string();

    let err = validate_inputs(&config).unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
  }

  #[test]
  fn mtimes_use_revision_time() {
    let dir = tempfile::tempdir().unwrap();
    let config = lockbox_config(dir.path(), "true");
    create_output_dirs(&config).unwrap();
    std::fs::write(&config.paths.bin_path, "hi").unwrap();

    normalize_mtimes(&config).unwrap();

    let modified = std::fs::metadata(&config.paths.bin_path).unwrap().modified().unwrap();
    let expected: SystemTime = config.product.revision_timestamp().unwrap().into();
    assert_eq!(modified, expected);
  }

  #[test]
  fn instructions_file_holds_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let config = lockbox_config(dir.path(), "echo hi > \"$BIN_PATH\"");
    let script = write_instructions(&config).unwrap();
    assert_eq!(std::fs::read_to_string(&script).unwrap(), "echo hi > \"$BIN_PATH\"");
    let path = script.to_path_buf();
    drop(script);
    assert!(!path.exists());
  }
}
