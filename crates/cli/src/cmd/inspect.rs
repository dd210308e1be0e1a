use anyhow::{Context, Result};

use repro_lib::config::{Config, Tool};

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_inspect(format: OutputFormat) -> Result<bool> {
  let config = Config::from_env(Tool::current()).context("Failed to resolve build config")?;

  if format.is_json() {
    print_json(&config)?;
    return Ok(true);
  }

  let product = &config.product;
  let params = &config.parameters;
  println!("Product:");
  print_stat("Name", &product.name);
  print_stat("Version", &product.version.full);
  print_stat("Revision", &product.revision);
  print_stat("Revision time", &product.revision_time);
  print_stat("Source hash", &product.source_hash);
  print_stat("Dirty", &product.is_dirty().to_string());
  println!();
  println!("Parameters:");
  print_stat("Target", &format!("{}/{}", params.os, params.arch));
  print_stat("Go version", &params.go_version);
  print_stat("Zip name", &params.zip_name);
  println!();
  println!("Paths:");
  print_stat("Work dir", &config.paths.work_dir.display().to_string());
  print_stat("Executable", &config.paths.bin_path.display().to_string());
  print_stat("Archive", &config.paths.zip_path.display().to_string());
  println!();
  print_stat("Tool", &config.tool.to_string());
  Ok(true)
}
