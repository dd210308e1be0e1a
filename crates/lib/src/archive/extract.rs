use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use super::ArchiveError;

/// Unpack the zip at `archive_path` into `dest`.
///
/// Every entry must resolve strictly inside `dest`; an entry such as
/// `../evil` fails with [`ArchiveError::IllegalPath`] before anything is
/// written for it. Directory entries are created; file entries get their
/// parent directories and, on Unix, their stored permissions.
pub fn extract(archive_path: &Path, dest: &Path) -> Result<(), ArchiveError> {
  let file = File::open(archive_path).map_err(|source| ArchiveError::Read {
    path: archive_path.to_path_buf(),
    source,
  })?;
  let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
  let root = clean_path(dest);

  fs::create_dir_all(&root)?;

  for i in 0..archive.len() {
    let mut entry = archive.by_index(i)?;
    let name = entry.name().to_string();
    let target = clean_path(&root.join(&name));

    if target == root || !target.starts_with(&root) {
      return Err(ArchiveError::IllegalPath(name));
    }

    if entry.is_dir() {
      fs::create_dir_all(&target)?;
      continue;
    }

    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent)?;
    }

    let mut outfile = File::create(&target)?;
    io::copy(&mut entry, &mut outfile)?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      if let Some(mode) = entry.unix_mode() {
        fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777))?;
      }
    }

    debug!(entry = %name, "extracted");
  }

  info!(archive = %archive_path.display(), dest = %root.display(), entries = archive.len(), "unpacked archive");
  Ok(())
}

/// Lexically normalize `path`: drop `.` components and resolve `..` against
/// preceding components. The filesystem is not consulted.
pub fn clean_path(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match out.components().next_back() {
        Some(Component::Normal(_)) => {
          out.pop();
        }
        Some(Component::RootDir | Component::Prefix(_)) => {}
        _ => out.push(".."),
      },
      other => out.push(other.as_os_str()),
    }
  }
  if out.as_os_str().is_empty() {
    out.push(".");
  }
  out
}
