//! Runs a build's steps in order and records the outcome.

use chrono::Utc;
use tracing::{Instrument, info, info_span, warn};

use super::result::{BuildResult, FileRecord};
use super::step::StepContext;
use super::{Build, BuildError};
use crate::env;

/// Run every step of `build`, stopping at the first failure.
///
/// Failures are recorded on the returned result as `"<step>: <cause>"`; they
/// are never returned as errors.
pub async fn run(build: &Build) -> BuildResult {
  let config = build.config();
  let span = info_span!(
    "build",
    kind = %build.kind(),
    product = %config.product.name,
    version = %config.product.version,
  );
  run_steps(build).instrument(span).await
}

async fn run_steps(build: &Build) -> BuildResult {
  let config = build.config();
  let settings = build.settings();

  let mut result = BuildResult::new(config.clone());
  result.env = env::project(config).iter().map(ToString::to_string).collect();
  result.start(Utc::now());

  let mut ctx = StepContext::default();
  for step in build.steps() {
    let desc = step.description();
    if settings.is_cancelled() {
      warn!(step = %desc, "failed: cancelled");
      result.fail(format!("{}: {}", desc, BuildError::Cancelled));
      break;
    }

    info!(step = %desc, "starting");
    match step.run(config, settings, &mut ctx).await {
      Ok(()) => info!(step = %desc, "ok"),
      Err(e) => {
        warn!(step = %desc, error = %e, kind = %e.kind(), "failed");
        result.fail(format!("{}: {}", desc, e));
        break;
      }
    }
  }

  if result.error().is_none() {
    match record_artifacts(&mut result) {
      Ok(()) => {}
      Err(e) => result.fail(format!("record artifacts: {}", e)),
    }
  }

  result.finish(Utc::now());
  info!(
    successful = result.successful,
    duration = %super::result::seconds::format(&result.meta.duration),
    "build finished"
  );
  result
}

fn record_artifacts(result: &mut BuildResult) -> Result<(), BuildError> {
  result.executable = FileRecord::from_path(&result.config.paths.bin_path)?;
  result.zip = FileRecord::from_path(&result.config.paths.zip_path)?;
  Ok(())
}
