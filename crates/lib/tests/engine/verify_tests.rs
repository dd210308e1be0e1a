use std::time::{Duration, Instant};

use repro_lib::build::{BuildError, RemoteBuild};
use repro_lib::cache::CacheLocator;
use repro_lib::verify::{VerificationState, verify_locally};

use super::common::{WRITE_HI, config, quiet, tool};

#[tokio::test]
async fn local_verification_reproduces() {
  let primary_root = tempfile::tempdir().unwrap();
  let verification_root = tempfile::tempdir().unwrap();
  let temp = tempfile::tempdir().unwrap();
  std::fs::write(primary_root.path().join("input.txt"), "source").unwrap();

  let primary = config(primary_root.path(), "cat input.txt > \"$BIN_PATH\"");
  let started = Instant::now();
  let outcome = verify_locally(
    &primary,
    verification_root.path(),
    temp.path(),
    Duration::from_secs(1),
    quiet(),
  )
  .await
  .unwrap();

  assert!(started.elapsed() >= Duration::from_secs(1));
  assert!(outcome.reproduced_correctly, "{}", outcome.error_message);
  assert_eq!(outcome.state(), VerificationState::Reproduced);
  assert_eq!(outcome.verification.config.paths.work_dir, verification_root.path());
  assert_eq!(
    std::fs::read_to_string(verification_root.path().join("dist/lockbox")).unwrap(),
    "source"
  );
}

#[tokio::test]
async fn stagger_exposes_timestamps() {
  let primary_root = tempfile::tempdir().unwrap();
  let verification_root = tempfile::tempdir().unwrap();
  let temp = tempfile::tempdir().unwrap();

  let primary = config(primary_root.path(), "date > \"$BIN_PATH\"");
  let outcome = verify_locally(
    &primary,
    verification_root.path(),
    temp.path(),
    Duration::from_millis(1500),
    quiet(),
  )
  .await
  .unwrap();

  assert!(!outcome.reproduced_correctly);
  assert_eq!(outcome.state(), VerificationState::NotReproduced);
  assert!(!outcome.hashes.bin.sha256.matches);
}

#[tokio::test]
async fn failed_primary_stops_verification() {
  let primary_root = tempfile::tempdir().unwrap();
  let verification_root = tempfile::tempdir().unwrap();
  let temp = tempfile::tempdir().unwrap();

  let primary = config(primary_root.path(), "exit 1");
  let err = verify_locally(&primary, verification_root.path(), temp.path(), Duration::ZERO, quiet())
    .await
    .unwrap_err();

  assert_eq!(err.kind(), repro_lib::ErrorKind::PrimaryFailed);
  assert!(!verification_root.path().join("dist").exists());
}

#[tokio::test]
async fn second_verification_uses_cache() {
  let primary_root = tempfile::tempdir().unwrap();
  let verification_root = tempfile::tempdir().unwrap();
  let temp = tempfile::tempdir().unwrap();
  let primary = config(primary_root.path(), WRITE_HI);

  let first = verify_locally(&primary, verification_root.path(), temp.path(), Duration::ZERO, quiet())
    .await
    .unwrap();
  let second = verify_locally(&primary, verification_root.path(), temp.path(), Duration::ZERO, quiet())
    .await
    .unwrap();

  assert_eq!(first.primary.meta, second.primary.meta);
  assert_eq!(first.verification.meta, second.verification.meta);
}

#[test]
fn dirty_remote_verification_is_refused() {
  let root = tempfile::tempdir().unwrap();
  let mut primary = config(root.path(), WRITE_HI);
  primary.product.repository = "hashicorp/lockbox".to_string();
  primary.product.source_hash = "0123abcd".to_string();

  let locator = CacheLocator::new(root.path(), tool());
  let err = RemoteBuild::new(&primary, &locator, quiet()).unwrap_err();
  assert!(matches!(err, BuildError::DirtySourceUnverifiable { .. }));
}
