//! Comparing a primary and a verification build.
//!
//! Both results are loaded from a [`ResultSource`]. Their product and
//! parameters must be identical; otherwise the comparison is meaningless and
//! fails with [`VerifyError::InputsDiverged`]. Artifact names and sizes must
//! match too. Differing digests are an outcome, not an error: the result
//! reports `reproduced_correctly == false`.

pub mod diff;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::build::{BuildError, BuildResult, FileRecord, LocalVerification, Primary, RemoteBuild, ResultFileError, Settings};
use crate::cache::{BuildKind, CacheLocator};
use crate::config::Config;
use crate::error::ErrorKind;
use crate::manager::{Manager, ManagerError};

#[derive(Debug, Error)]
pub enum VerifyError {
  #[error("failed to load {kind} result: {source}")]
  Manager {
    kind: BuildKind,
    #[source]
    source: ManagerError,
  },

  #[error("failed to load {kind} result: {source}")]
  File {
    kind: BuildKind,
    #[source]
    source: ResultFileError,
  },

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error("primary build failed: {0}")]
  PrimaryFailed(String),

  #[error("verification build failed: {0}")]
  VerificationFailed(String),

  #[error("build inputs diverged:\n{0}")]
  InputsDiverged(String),

  #[error("{description} names differ: {primary:?} != {verification:?}")]
  NameMismatch {
    description: String,
    primary: String,
    verification: String,
  },

  #[error("{description} sizes differ: {primary} != {verification}")]
  SizeMismatch {
    description: String,
    primary: u64,
    verification: u64,
  },
}

impl VerifyError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Manager { source, .. } => source.kind(),
      Self::File { source, .. } => source.kind(),
      Self::Build(e) => e.kind(),
      Self::PrimaryFailed(_) => ErrorKind::PrimaryFailed,
      Self::VerificationFailed(_) => ErrorKind::VerificationFailed,
      Self::InputsDiverged(_) => ErrorKind::InputsDiverged,
      Self::NameMismatch { .. } => ErrorKind::NameMismatch,
      Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
    }
  }

  /// How far the verification got before failing.
  pub fn state(&self) -> VerificationState {
    match self {
      Self::Manager { kind, .. } | Self::File { kind, .. } => match kind {
        BuildKind::Primary => VerificationState::NeedPrimary,
        BuildKind::Verification => VerificationState::NeedVerification,
      },
      Self::Build(_) | Self::VerificationFailed(_) => VerificationState::NeedVerification,
      Self::PrimaryFailed(_) => VerificationState::NeedPrimary,
      Self::InputsDiverged(_) => VerificationState::Invalid,
      Self::NameMismatch { .. } | Self::SizeMismatch { .. } => VerificationState::Compared,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
  NeedPrimary,
  NeedVerification,
  Compared,
  Reproduced,
  NotReproduced,
  Invalid,
}

/// Where a build result comes from.
#[derive(Debug, Clone)]
pub enum ResultSource {
  /// Cached, or built on a miss.
  Manager(Manager),
  /// A JSON result written earlier.
  File(PathBuf),
  Loaded(BuildResult),
}

impl ResultSource {
  pub async fn load(&self, kind: BuildKind) -> Result<BuildResult, VerifyError> {
    match self {
      Self::Manager(manager) => manager
        .result()
        .await
        .map_err(|source| VerifyError::Manager { kind, source }),
      Self::File(path) => BuildResult::read_json(path).map_err(|source| VerifyError::File { kind, source }),
      Self::Loaded(result) => Ok(result.clone()),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HashPair {
  pub primary: String,
  pub verification: String,
  #[serde(rename = "Match")]
  pub matches: bool,
}

impl HashPair {
  pub fn new(primary: impl Into<String>, verification: impl Into<String>) -> Self {
    let primary = primary.into();
    let verification = verification.into();
    let matches = !primary.is_empty() && primary == verification;
    Self {
      primary,
      verification,
      matches,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileHashes {
  pub name: String,
  pub description: String,
  #[serde(rename = "SHA256")]
  pub sha256: HashPair,
}

impl FileHashes {
  /// Pair up two records of the same artifact. Names and sizes must agree.
  pub fn new(description: &str, primary: &FileRecord, verification: &FileRecord) -> Result<Self, VerifyError> {
    if primary.name != verification.name {
      return Err(VerifyError::NameMismatch {
        description: description.to_string(),
        primary: primary.name.clone(),
        verification: verification.name.clone(),
      });
    }
    if primary.size != verification.size {
      return Err(VerifyError::SizeMismatch {
        description: description.to_string(),
        primary: primary.size,
        verification: verification.size,
      });
    }
    Ok(Self {
      name: primary.name.clone(),
      description: description.to_string(),
      sha256: HashPair::new(&primary.sha256_sum, &verification.sha256_sum),
    })
  }

  pub fn matches(&self) -> bool {
    self.sha256.matches
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileSetHashes {
  pub bin: FileHashes,
  pub zip: FileHashes,
  pub all_match: bool,
}

impl FileSetHashes {
  pub fn new(primary: &BuildResult, verification: &BuildResult) -> Result<Self, VerifyError> {
    let bin = FileHashes::new("executable", &primary.executable, &verification.executable)?;
    let zip = FileHashes::new("zip archive", &primary.zip, &verification.zip)?;
    let all_match = bin.matches() && zip.matches();
    Ok(Self { bin, zip, all_match })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VerificationResult {
  pub primary: BuildResult,
  pub verification: BuildResult,
  pub hashes: FileSetHashes,
  pub reproduced_correctly: bool,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub error_message: String,
}

impl VerificationResult {
  pub fn state(&self) -> VerificationState {
    if self.reproduced_correctly {
      VerificationState::Reproduced
    } else {
      VerificationState::NotReproduced
    }
  }

  pub fn read_json(path: &Path) -> Result<Self, ResultFileError> {
    let data = std::fs::read(path).map_err(|source| ResultFileError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ResultFileError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn write_json(&self, path: &Path) -> Result<(), ResultFileError> {
    crate::build::result::write_json(path, self)
  }
}

#[derive(Debug, Clone)]
pub struct Verifier {
  primary: ResultSource,
  verification: ResultSource,
}

impl Verifier {
  pub fn new(primary: ResultSource, verification: ResultSource) -> Self {
    Self { primary, verification }
  }

  pub async fn verify(&self) -> Result<VerificationResult, VerifyError> {
    debug!(state = ?VerificationState::NeedPrimary, "loading primary result");
    let primary = require_success(self.primary.load(BuildKind::Primary).await?, BuildKind::Primary)?;

    debug!(state = ?VerificationState::NeedVerification, "loading verification result");
    let verification = self.verification.load(BuildKind::Verification).await?;
    let verification = require_success(verification, BuildKind::Verification)?;

    compare(primary, verification)
  }
}

fn require_success(result: BuildResult, kind: BuildKind) -> Result<BuildResult, VerifyError> {
  if result.successful {
    return Ok(result);
  }
  let message = result.error().unwrap_or("build did not succeed").to_string();
  Err(match kind {
    BuildKind::Primary => VerifyError::PrimaryFailed(message),
    BuildKind::Verification => VerifyError::VerificationFailed(message),
  })
}

/// Compare two loaded results.
pub fn compare(primary: BuildResult, verification: BuildResult) -> Result<VerificationResult, VerifyError> {
  let mut diffs = diff::diff(
    "Product",
    &primary.config.product,
    &verification.config.product,
  );
  diffs.extend(diff::diff(
    "Parameters",
    &primary.config.parameters,
    &verification.config.parameters,
  ));
  if !diffs.is_empty() {
    warn!(differences = diffs.len(), state = ?VerificationState::Invalid, "build inputs diverged");
    return Err(VerifyError::InputsDiverged(diff::render(&diffs)));
  }

  let hashes = FileSetHashes::new(&primary, &verification)?;
  let reproduced_correctly = hashes.all_match;
  let error_message = if reproduced_correctly {
    String::new()
  } else {
    mismatch_message(&hashes)
  };

  info!(
    reproduced = reproduced_correctly,
    bin = hashes.bin.matches(),
    zip = hashes.zip.matches(),
    "compared builds"
  );
  Ok(VerificationResult {
    primary,
    verification,
    hashes,
    reproduced_correctly,
    error_message,
  })
}

fn mismatch_message(hashes: &FileSetHashes) -> String {
  [&hashes.bin, &hashes.zip]
    .iter()
    .filter(|h| !h.matches())
    .map(|h| {
      format!(
        "{} {} digest mismatch: {} != {}",
        h.description, h.name, h.sha256.primary, h.sha256.verification
      )
    })
    .collect::<Vec<_>>()
    .join("; ")
}

/// Build (or load) the primary, rebuild it under `verification_root` no
/// earlier than `stagger` after the primary started, and compare.
pub async fn verify_locally(
  primary: &Config,
  verification_root: &Path,
  temp_root: &Path,
  stagger: Duration,
  settings: Settings,
) -> Result<VerificationResult, VerifyError> {
  let primary_manager = Manager::new(Primary::new(primary.clone(), settings.clone()), temp_root);
  let primary_result = ResultSource::Manager(primary_manager).load(BuildKind::Primary).await?;
  let primary_result = require_success(primary_result, BuildKind::Primary)?;

  let local = LocalVerification::for_primary(
    primary,
    verification_root,
    Some(primary_result.meta.start),
    stagger,
    settings,
  )?;
  info!(root = %verification_root.display(), start_after = %local.start_after(), "verifying locally");

  Verifier::new(
    ResultSource::Loaded(primary_result),
    ResultSource::Manager(Manager::new(local, temp_root)),
  )
  .verify()
  .await
}

/// Like [`verify_locally`], but rebuild from the source archive at `host`.
pub async fn verify_remotely(
  primary: &Config,
  temp_root: &Path,
  host: Option<&str>,
  settings: Settings,
) -> Result<VerificationResult, VerifyError> {
  let locator = CacheLocator::for_config(temp_root, primary);
  let mut remote = RemoteBuild::new(primary, &locator, settings.clone())?;
  if let Some(host) = host {
    remote = remote.with_host(host);
  }
  let primary_manager = Manager::with_locator(Primary::new(primary.clone(), settings), locator.clone());

  Verifier::new(
    ResultSource::Manager(primary_manager),
    ResultSource::Manager(Manager::with_locator(remote, locator)),
  )
  .verify()
  .await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::lockbox_config;

  fn record(name: &str, size: u64, sum: &str) -> FileRecord {
    FileRecord {
      name: name.to_string(),
      original_path: PathBuf::from("/w/dist").join(name),
      size,
      sha256_sum: sum.to_string(),
    }
  }

  fn result(root: &Path, bin_sum: &str) -> BuildResult {
    let mut result = BuildResult::new(lockbox_config(root, "true"));
    result.executable = record("lockbox", 3, bin_sum);
    result.zip = record("lockbox_1.2.3_linux_amd64.zip", 120, "zz");
    result.successful = true;
    result
  }

  #[test]
  fn hash_pair_needs_non_empty_equal_sums() {
    assert!(HashPair::new("ab", "ab").matches);
    assert!(!HashPair::new("ab", "cd").matches);
    assert!(!HashPair::new("", "").matches);
  }

  #[test]
  fn name_mismatch_is_an_error() {
    let err = FileHashes::new("executable", &record("a", 1, "x"), &record("b", 1, "x")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NameMismatch);
  }

  #[test]
  fn size_mismatch_is_an_error() {
    let err = FileHashes::new("executable", &record("a", 1, "x"), &record("a", 2, "y")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
    assert_eq!(err.state(), VerificationState::Compared);
  }

  #[test]
  fn identical_results_reproduce() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let outcome = compare(result(a.path(), "aa"), result(b.path(), "aa")).unwrap();
    assert!(outcome.reproduced_correctly);
    assert!(outcome.hashes.all_match);
    assert_eq!(outcome.state(), VerificationState::Reproduced);
    assert!(outcome.error_message.is_empty());
  }

  #[test]
  fn digest_mismatch_is_an_outcome() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let outcome = compare(result(a.path(), "aa"), result(b.path(), "bb")).unwrap();
    assert!(!outcome.reproduced_correctly);
    assert!(!outcome.hashes.bin.sha256.matches);
    assert!(outcome.hashes.zip.sha256.matches);
    assert_eq!(outcome.state(), VerificationState::NotReproduced);
    assert!(outcome.error_message.contains("executable lockbox digest mismatch"));
  }

  #[test]
  fn diverged_parameters_are_invalid() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let mut verification = result(b.path(), "aa");
    verification.config.parameters.go_version = "1.19".to_string();

    let err = compare(result(a.path(), "aa"), verification).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputsDiverged);
    assert_eq!(err.state(), VerificationState::Invalid);
    assert!(err.to_string().contains("Parameters.GoVersion"));
  }

  #[tokio::test]
  async fn failed_primary_is_surfaced() {
    let a = tempfile::tempdir().unwrap();
    let mut failed = result(a.path(), "aa");
    failed.successful = false;
    failed.error_message = "run instructions: boom".to_string();

    let verifier = Verifier::new(ResultSource::Loaded(failed), ResultSource::Loaded(result(a.path(), "aa")));
    let err = verifier.verify().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PrimaryFailed);
  }

  #[tokio::test]
  async fn results_load_from_files() {
    let a = tempfile::tempdir().unwrap();
    let primary_path = a.path().join("primary.json");
    let verification_path = a.path().join("verification.json");
    result(a.path(), "aa").write_json(&primary_path).unwrap();
    result(a.path(), "aa").write_json(&verification_path).unwrap();

    let outcome = Verifier::new(
      ResultSource::File(primary_path),
      ResultSource::File(verification_path),
    )
    .verify()
    .await
    .unwrap();
    assert!(outcome.reproduced_correctly);

    let out = a.path().join("verification-result.json");
    outcome.write_json(&out).unwrap();
    assert_eq!(VerificationResult::read_json(&out).unwrap(), outcome);
  }

  #[tokio::test]
  async fn missing_result_file_names_the_side() {
    let a = tempfile::tempdir().unwrap();
    let verifier = Verifier::new(
      ResultSource::Loaded(result(a.path(), "aa")),
      ResultSource::File(a.path().join("nope.json")),
    );
    let err = verifier.verify().await.unwrap_err();
    assert_eq!(err.state(), VerificationState::NeedVerification);
    assert_eq!(err.kind(), ErrorKind::Io);
  }
}
