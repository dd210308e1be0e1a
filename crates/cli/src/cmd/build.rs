//! Implementation of the `repro build` command.

use anyhow::{Context, Result};

use repro_lib::build::{BuildResult, Primary, result::seconds};
use repro_lib::config::{Config, Tool};
use repro_lib::manager::Manager;

use super::{runtime, settings};
use crate::output::{
  OutputFormat, format_bytes, print_error, print_json, print_stat, print_success, truncate_hash,
};

/// Run the primary build through the result cache. Returns whether it succeeded.
pub fn cmd_build(rebuild: bool, format: OutputFormat) -> Result<bool> {
  let config = Config::from_env(Tool::current()).context("Failed to resolve build config")?;
  let (rt, token) = runtime()?;

  let manager = Manager::new(Primary::new(config, settings(token, rebuild)), std::env::temp_dir());
  let result = rt.block_on(manager.result()).context("Build failed")?;

  if format.is_json() {
    print_json(&result)?;
  } else {
    print_build(&result);
  }
  Ok(result.successful)
}

fn print_build(result: &BuildResult) {
  let product = &result.config.product;
  if result.successful {
    print_success(&format!("Built {} {}", product.name, product.version));
  } else {
    print_error(&format!("Build of {} {} failed: {}", product.name, product.version, result.error_message));
    return;
  }

  print_stat("Executable", &result.executable.original_path.display().to_string());
  print_stat(
    "  sha256",
    &format!("{} ({})", truncate_hash(&result.executable.sha256_sum), format_bytes(result.executable.size)),
  );
  print_stat("Archive", &result.zip.original_path.display().to_string());
  print_stat(
    "  sha256",
    &format!("{} ({})", truncate_hash(&result.zip.sha256_sum), format_bytes(result.zip.size)),
  );
  print_stat("Duration", &seconds::format(&result.meta.duration));
}
