use repro_lib::build::{Build, RemoteBuild};
use repro_lib::cache::{BuildKind, CacheLocator};
use repro_lib::config::Config;
use repro_lib::verify::verify_remotely;

use super::common::{config, quiet, serve, source_zip, tool};

const ARCHIVE_PATH: &str = "/hashicorp/lockbox/archive/cabba9e.zip";
const INSTRUCTIONS: &str = "cat src/main.txt > \"$BIN_PATH\"";

fn remote_config(root: &std::path::Path) -> Config {
  let mut config = config(root, INSTRUCTIONS);
  config.product.repository = "hashicorp/lockbox".to_string();
  config.init().unwrap()
}

#[tokio::test]
async fn remote_build_fetches_and_builds() {
  let root = tempfile::tempdir().unwrap();
  let temp = tempfile::tempdir().unwrap();
  let host = serve(
    ARCHIVE_PATH,
    source_zip("lockbox-cabba9e", &[("src/main.txt", "remote source")]),
  )
  .await;

  let locator = CacheLocator::new(temp.path(), tool());
  let remote = RemoteBuild::new(&remote_config(root.path()), &locator, quiet())
    .unwrap()
    .with_host(host);
  let result = Build::from(remote).run().await;

  assert!(result.successful, "{}", result.error_message);
  let work_dir = locator.source_path(BuildKind::Verification, "cabba9e");
  assert_eq!(result.config.paths.work_dir, work_dir);
  assert_eq!(
    std::fs::read_to_string(work_dir.join("dist/lockbox")).unwrap(),
    "remote source"
  );
}

#[tokio::test]
async fn missing_archive_fails_the_fetch_step() {
  let root = tempfile::tempdir().unwrap();
  let temp = tempfile::tempdir().unwrap();
  let host = serve("/elsewhere.zip", Vec::new()).await;

  let locator = CacheLocator::new(temp.path(), tool());
  let remote = RemoteBuild::new(&remote_config(root.path()), &locator, quiet())
    .unwrap()
    .with_host(host);
  let result = Build::from(remote).run().await;

  assert!(!result.successful);
  assert!(result.error_message.starts_with("fetch http://"), "{}", result.error_message);
  assert!(result.error_message.contains("404 Not Found"), "{}", result.error_message);
}

#[tokio::test]
async fn remote_verification_matches_primary() {
  let root = tempfile::tempdir().unwrap();
  let temp = tempfile::tempdir().unwrap();
  std::fs::create_dir_all(root.path().join("src")).unwrap();
  std::fs::write(root.path().join("src/main.txt"), "same source").unwrap();
  let host = serve(
    ARCHIVE_PATH,
    source_zip("lockbox-cabba9e", &[("src/main.txt", "same source")]),
  )
  .await;

  let outcome = verify_remotely(&remote_config(root.path()), temp.path(), Some(&host), quiet())
    .await
    .unwrap();

  assert!(outcome.reproduced_correctly, "{}", outcome.error_message);
  assert_ne!(
    outcome.primary.config.paths.work_dir,
    outcome.verification.config.paths.work_dir
  );
}
