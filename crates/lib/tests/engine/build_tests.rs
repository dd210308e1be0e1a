use repro_lib::build::{Build, Primary};
use repro_lib::util::hash::sha256_hex;
use repro_lib::verify::compare;

use super::common::{WRITE_HI, config, quiet};

async fn build(root: &std::path::Path, instructions: &str) -> repro_lib::build::BuildResult {
  Build::from(Primary::new(config(root, instructions), quiet())).run().await
}

#[tokio::test]
async fn happy_primary_build() {
  let root = tempfile::tempdir().unwrap();
  let result = build(root.path(), WRITE_HI).await;

  assert!(result.successful, "{}", result.error_message);
  assert_eq!(result.executable.name, "lockbox");
  assert_eq!(result.zip.name, "lockbox_1.2.3_linux_amd64.zip");
  assert_eq!(result.executable.sha256_sum, sha256_hex(&result.config.paths.bin_path).unwrap());
  assert_eq!(result.zip.sha256_sum, sha256_hex(&result.config.paths.zip_path).unwrap());
  assert!(result.error_message.is_empty());
}

#[tokio::test]
async fn archive_holds_the_target_dir_flat() {
  let root = tempfile::tempdir().unwrap();
  let script = format!("{}\nmkdir -p dist/docs && echo readme > dist/docs/README", WRITE_HI);
  let result = build(root.path(), &script).await;
  assert!(result.successful, "{}", result.error_message);

  let file = std::fs::File::open(&result.config.paths.zip_path).unwrap();
  let archive = zip::ZipArchive::new(file).unwrap();
  let names: Vec<_> = archive.file_names().map(str::to_string).collect();
  assert_eq!(names.len(), 2);
  assert!(names.contains(&"lockbox".to_string()));
  assert!(names.contains(&"README".to_string()));
}

#[tokio::test]
async fn reproducible_pair() {
  let a = tempfile::tempdir().unwrap();
  let b = tempfile::tempdir().unwrap();
  let first = build(a.path(), WRITE_HI).await;
  tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
  let second = build(b.path(), WRITE_HI).await;

  assert_ne!(first.meta.start, second.meta.start);
  assert_ne!(first.config.paths, second.config.paths);
  assert_eq!(first.executable.sha256_sum, second.executable.sha256_sum);
  assert_eq!(first.zip.sha256_sum, second.zip.sha256_sum);

  let outcome = compare(first, second).unwrap();
  assert!(outcome.reproduced_correctly);
}

#[tokio::test]
async fn nested_target_files_archive_reproducibly() {
  let script = format!("{}\nmkdir -p dist/docs && echo readme > dist/docs/README", WRITE_HI);
  let a = tempfile::tempdir().unwrap();
  let b = tempfile::tempdir().unwrap();
  let first = build(a.path(), &script).await;
  tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
  let second = build(b.path(), &script).await;

  assert!(first.successful, "{}", first.error_message);
  assert!(second.successful, "{}", second.error_message);
  assert_eq!(first.zip.sha256_sum, second.zip.sha256_sum);
  assert!(compare(first, second).unwrap().reproduced_correctly);
}

#[tokio::test]
async fn introduced_nondeterminism() {
  let a = tempfile::tempdir().unwrap();
  let b = tempfile::tempdir().unwrap();
  let first = build(a.path(), "date > \"$BIN_PATH\"").await;
  tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
  let second = build(b.path(), "date > \"$BIN_PATH\"").await;

  let outcome = compare(first, second).unwrap();
  assert!(!outcome.reproduced_correctly);
  assert!(!outcome.hashes.bin.sha256.matches);
}

#[tokio::test]
async fn missing_artifact() {
  let root = tempfile::tempdir().unwrap();
  let result = build(root.path(), "echo done").await;

  assert!(!result.successful);
  assert!(result.error_message.contains("no file written"), "{}", result.error_message);
  assert!(!result.executable.is_populated());
}

#[tokio::test]
async fn diverged_inputs() {
  let a = tempfile::tempdir().unwrap();
  let b = tempfile::tempdir().unwrap();
  let first = build(a.path(), WRITE_HI).await;
  let mut second = build(b.path(), WRITE_HI).await;
  second.config.parameters.go_version = "1.19".to_string();

  let err = compare(first, second).unwrap_err();
  assert_eq!(err.kind(), repro_lib::ErrorKind::InputsDiverged);
}

#[tokio::test]
async fn result_json_round_trips() {
  let root = tempfile::tempdir().unwrap();
  let result = build(root.path(), WRITE_HI).await;
  let path = root.path().join("meta").join("result.json");

  result.write_json(&path).unwrap();
  let loaded = repro_lib::build::BuildResult::read_json(&path).unwrap();
  assert_eq!(loaded, result);

  let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
  assert!(json["Meta"]["Duration"].as_str().unwrap().ends_with('s'));
  assert_eq!(json["Executable"]["Name"], "lockbox");
  assert!(json.get("ErrorMessage").is_none());
}
