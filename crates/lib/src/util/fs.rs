//! Filesystem helpers used by the build steps.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;
use tempfile::{NamedTempFile, TempPath};
use tracing::debug;
use walkdir::WalkDir;

/// Create every directory in `dirs`, including missing parents.
pub fn mkdir_all<P: AsRef<Path>>(dirs: &[P]) -> io::Result<()> {
  for dir in dirs {
    fs::create_dir_all(dir.as_ref())?;
  }
  Ok(())
}

/// Returns whether a regular file exists at `path`.
///
/// A directory at `path` is an error rather than `false`.
pub fn file_exists(path: &Path) -> io::Result<bool> {
  match fs::metadata(path) {
    Ok(meta) if meta.is_dir() => Err(io::Error::other(format!("{} is a directory", path.display()))),
    Ok(_) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
  }
}

/// Set atime and mtime of every regular file directly inside `dir` to `time`.
///
/// Subdirectories are not descended into. Returns the number of files touched.
pub fn set_mtimes(dir: &Path, time: SystemTime) -> io::Result<usize> {
  let stamp = FileTime::from_system_time(time);
  let mut touched = 0;

  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    }
    filetime::set_file_times(entry.path(), stamp, stamp)?;
    touched += 1;
  }

  debug!(dir = %dir.display(), files = touched, "normalized mtimes");
  Ok(touched)
}

/// Write `contents` to a fresh temporary file that is removed when the returned path is dropped.
pub fn write_temp_file(prefix: &str, suffix: &str, contents: &[u8]) -> io::Result<TempPath> {
  let mut file = tempfile::Builder::new().prefix(prefix).suffix(suffix).tempfile()?;
  file.write_all(contents)?;
  file.as_file().sync_all()?;
  Ok(file.into_temp_path())
}

/// Replace `path` with `contents` without exposing a partially written file.
///
/// The data is written to a temporary file in the same directory and renamed into place.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
  let dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  fs::create_dir_all(dir)?;

  let mut file = NamedTempFile::new_in(dir)?;
  file.write_all(contents)?;
  file.as_file().sync_all()?;
  file.persist(path).map_err(|e| e.error)?;
  Ok(())
}

/// Remove a directory tree, treating a missing directory as success.
pub fn remove_dir_all(path: &Path) -> io::Result<()> {
  match fs::remove_dir_all(path) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    other => other,
  }
}

/// Recursively copy `src` into `dst`.
///
/// Top-level entries of `src` named in `exclude` are skipped. Symlinks are
/// recreated rather than followed.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &[&str]) -> io::Result<u64> {
  let mut copied = 0;
  fs::create_dir_all(dst)?;

  let walker = WalkDir::new(src).min_depth(1).sort_by_file_name().into_iter().filter_entry(|e| {
    e.depth() != 1
      || e
        .file_name()
        .to_str()
        .map(|name| !exclude.contains(&name))
        .unwrap_or(true)
  });

  for entry in walker {
    let entry = entry.map_err(io::Error::other)?;
    let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    let target: PathBuf = dst.join(rel);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      fs::create_dir_all(&target)?;
    } else if file_type.is_symlink() {
      copy_symlink(entry.path(), &target)?;
    } else if file_type.is_file() {
      fs::copy(entry.path(), &target)?;
      copied += 1;
    }
  }

  debug!(src = %src.display(), dst = %dst.display(), files = copied, "copied tree");
  Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
  let points_to = fs::read_link(link)?;
  std::os::unix::fs::symlink(points_to, target)
}

#[cfg(windows)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
  let points_to = fs::read_link(link)?;
  if link.is_dir() {
    std::os::windows::fs::symlink_dir(points_to, target)
  } else {
    std::os::windows::fs::symlink_file(points_to, target)
  }
}
