use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tempfile::TempPath;

use super::{BuildError, Settings, common, local, remote};
use crate::config::Config;

/// One named unit of work in a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  RemoveWorkDir,
  CopyPrimaryRoot { from: PathBuf },
  WaitUntil { deadline: DateTime<Utc> },
  PrepareSourceDirs { download_dir: PathBuf },
  FetchSource { url: String, dest: PathBuf },
  ExtractSource { archive: PathBuf, dest: PathBuf },
  MoveSourceIntoPlace { url: String, download_dir: PathBuf },
  ValidateInputs,
  CreateOutputDirs,
  WriteInstructions,
  RunInstructions,
  AssertExecutableWritten,
  NormalizeMtimes,
  CreateArchive,
}

/// The steps shared by all variants.
pub const CORE_STEPS: [Step; 7] = [
  Step::ValidateInputs,
  Step::CreateOutputDirs,
  Step::WriteInstructions,
  Step::RunInstructions,
  Step::AssertExecutableWritten,
  Step::NormalizeMtimes,
  Step::CreateArchive,
];

/// State carried from one step to a later one.
#[derive(Debug, Default)]
pub(crate) struct StepContext {
  pub instructions: Option<TempPath>,
}

impl Step {
  pub fn description(&self) -> String {
    match self {
      Self::RemoveWorkDir => "remove work dir".to_string(),
      Self::CopyPrimaryRoot { from } => format!("copy {} into work dir", from.display()),
      Self::WaitUntil { deadline } => format!("wait until {}", deadline.to_rfc3339()),
      Self::PrepareSourceDirs { .. } => "prepare source dirs".to_string(),
      Self::FetchSource { url, .. } => format!("fetch {}", url),
      Self::ExtractSource { .. } => "extract source archive".to_string(),
      Self::MoveSourceIntoPlace { .. } => "move source into work dir".to_string(),
      Self::ValidateInputs => "validate inputs".to_string(),
      Self::CreateOutputDirs => "create output directories".to_string(),
      Self::WriteInstructions => "write instructions to temp file".to_string(),
      Self::RunInstructions => "run instructions".to_string(),
      Self::AssertExecutableWritten => "assert executable written".to_string(),
      Self::NormalizeMtimes => "normalize mtimes".to_string(),
      Self::CreateArchive => "create archive".to_string(),
    }
  }

  pub(crate) async fn run(&self, config: &Config, settings: &Settings, ctx: &mut StepContext) -> Result<(), BuildError> {
    match self {
      Self::RemoveWorkDir => local::remove_work_dir(config),
      Self::CopyPrimaryRoot { from } => local::copy_primary_root(from, config),
      Self::WaitUntil { deadline } => local::wait_until(*deadline, settings).await,
      Self::PrepareSourceDirs { download_dir } => remote::prepare_source_dirs(download_dir, config),
      Self::FetchSource { url, dest } => remote::fetch_source(url, dest, settings).await,
      Self::ExtractSource { archive, dest } => remote::extract_source(archive, dest),
      Self::MoveSourceIntoPlace { url, download_dir } => remote::move_source_into_place(url, download_dir, config),
      Self::ValidateInputs => common::validate_inputs(config),
      Self::CreateOutputDirs => common::create_output_dirs(config),
      Self::WriteInstructions => {
        ctx.instructions = Some(common::write_instructions(config)?);
        Ok(())
      }
      Self::RunInstructions => common::run_instructions(config, settings, ctx.instructions.as_ref()).await,
      Self::AssertExecutableWritten => common::assert_executable_written(config),
      Self::NormalizeMtimes => common::normalize_mtimes(config),
      Self::CreateArchive => common::create_archive(config),
    }
  }
}

impl std::fmt::Display for Step {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.description())
  }
}
