//! Implementation of the `repro verify` command.
//!
//! The primary result comes from a file or from a (cached) build of the
//! current tree. The verification result comes from a file, a local rebuild
//! of a copy of the tree, or a rebuild from the repository host's archive.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use repro_lib::build::{BuildResult, LocalVerification, Primary, RemoteBuild};
use repro_lib::cache::CacheLocator;
use repro_lib::config::{ConfigOptions, Tool};
use repro_lib::manager::Manager;
use repro_lib::verify::{FileHashes, ResultSource, VerificationResult, Verifier};

use super::{runtime, settings};
use crate::output::{OutputFormat, print_error, print_json, print_stat, print_success, print_warning};

pub struct VerifyArgs {
  pub stagger: Duration,
  pub remote: bool,
  pub source_host: Option<String>,
  pub primary_result: Option<PathBuf>,
  pub verification_result: Option<PathBuf>,
  pub write: Option<PathBuf>,
  pub rebuild: bool,
}

/// Returns whether the build reproduced.
pub fn cmd_verify(args: VerifyArgs, format: OutputFormat) -> Result<bool> {
  let (rt, token) = runtime()?;
  let settings = settings(token, args.rebuild);
  let options = ConfigOptions::from_env();
  let temp_root = std::env::temp_dir();

  let primary = match &args.primary_result {
    Some(path) => BuildResult::read_json(path)?,
    None => {
      let config = options
        .clone()
        .into_config(Tool::current())
        .context("Failed to resolve build config")?;
      let manager = Manager::new(Primary::new(config, settings.clone()), &temp_root);
      rt.block_on(manager.result()).context("Primary build failed")?
    }
  };
  if !primary.successful {
    print_error(&format!("Primary build failed: {}", primary.error_message));
    return Ok(false);
  }

  let locator = CacheLocator::for_config(&temp_root, &primary.config);
  let verification = match &args.verification_result {
    Some(path) => ResultSource::File(path.clone()),
    None if args.remote => {
      let mut remote = RemoteBuild::new(&primary.config, &locator, settings)?;
      if let Some(host) = &args.source_host {
        remote = remote.with_host(host);
      }
      ResultSource::Manager(Manager::with_locator(remote, locator))
    }
    None => {
      if args.source_host.is_some() {
        bail!("--source-host only applies to --remote");
      }
      let root = options
        .verification_build_root
        .clone()
        .unwrap_or_else(|| locator.verification_root(&primary.config.product.source_hash));
      let local = LocalVerification::for_primary(
        &primary.config,
        root,
        Some(primary.meta.start),
        args.stagger,
        settings,
      )?;
      ResultSource::Manager(Manager::with_locator(local, locator))
    }
  };

  let verifier = Verifier::new(ResultSource::Loaded(primary), verification);
  let outcome = match rt.block_on(verifier.verify()) {
    Ok(outcome) => outcome,
    Err(e) => {
      print_error(&format!("Verification failed ({}): {}", e.kind(), e));
      return Ok(false);
    }
  };

  if let Some(path) = &args.write {
    outcome.write_json(path)?;
  }

  if format.is_json() {
    print_json(&outcome)?;
  } else {
    print_outcome(&outcome);
  }
  Ok(outcome.reproduced_correctly)
}

fn print_outcome(outcome: &VerificationResult) {
  let product = &outcome.primary.config.product;
  if outcome.reproduced_correctly {
    print_success(&format!("{} {} reproduced correctly", product.name, product.version));
  } else {
    print_warning(&format!("{} {} did not reproduce", product.name, product.version));
  }
  print_hashes(&outcome.hashes.bin);
  print_hashes(&outcome.hashes.zip);
}

fn print_hashes(hashes: &FileHashes) {
  let verdict = if hashes.matches() { "match" } else { "MISMATCH" };
  print_stat(&format!("{} {}", hashes.description, hashes.name), verdict);
  print_stat("  primary", &hashes.sha256.primary);
  print_stat("  verification", &hashes.sha256.verification);
}
