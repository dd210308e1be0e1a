use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::ArchiveError;

/// Permission bits recorded for every entry.
const ENTRY_MODE: u32 = 0o755;

/// Writes a zip with every entry at the archive root.
pub struct FlatZipWriter<W: Write + Seek> {
  zip: ZipWriter<W>,
  names: BTreeSet<String>,
}

impl<W: Write + Seek> FlatZipWriter<W> {
  pub fn new(sink: W) -> Self {
    Self {
      zip: ZipWriter::new(sink),
      names: BTreeSet::new(),
    }
  }

  /// Add an entry stamped with the zip epoch (1980-01-01T00:00:00).
  pub fn add<R: Read>(&mut self, name: &str, reader: R) -> Result<(), ArchiveError> {
    self.add_with_time(name, reader, zip::DateTime::default())
  }

  /// Add the file at `path` under its base name, stamped with `time`.
  ///
  /// The file's own mtime is ignored.
  pub fn add_file(&mut self, path: &Path, time: SystemTime) -> Result<(), ArchiveError> {
    let name = path
      .file_name()
      .and_then(|n| n.to_str())
      .ok_or_else(|| ArchiveError::InvalidName(path.display().to_string()))?;
    let read_err = |source| ArchiveError::Read {
      path: path.to_path_buf(),
      source,
    };

    let file = File::open(path).map_err(read_err)?;
    self.add_with_time(name, file, zip_time(time))
  }

  fn add_with_time<R: Read>(&mut self, name: &str, mut reader: R, time: zip::DateTime) -> Result<(), ArchiveError> {
    let base = base_name(name)?;
    if !self.names.insert(base.to_string()) {
      return Err(ArchiveError::DuplicateEntry(base.to_string()));
    }

    let options = SimpleFileOptions::default()
      .compression_method(CompressionMethod::Deflated)
      .last_modified_time(time)
      .unix_permissions(ENTRY_MODE);

    self.zip.start_file(base, options)?;
    io::copy(&mut reader, &mut self.zip)?;
    debug!(entry = base, "added archive entry");
    Ok(())
  }

  /// Names written so far, in lexical order.
  pub fn entries(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }

  /// Write the central directory and return the sink.
  pub fn finish(self) -> Result<W, ArchiveError> {
    Ok(self.zip.finish()?)
  }
}

/// Zip every regular file under `dir` into a flat archive at `dest`.
///
/// Files are visited depth-first in lexical order; directories contribute
/// only their contents. Every entry is stamped with `time`, so nested files
/// written at different wall-clock times still archive identically. Returns
/// the entry names in archive order.
pub fn zip_dir(dir: &Path, dest: &Path, time: SystemTime) -> Result<Vec<String>, ArchiveError> {
  let mut writer = FlatZipWriter::new(File::create(dest)?);
  let mut written = Vec::new();

  for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
    let entry = entry.map_err(io::Error::from)?;
    if !entry.file_type().is_file() {
      continue;
    }
    writer.add_file(entry.path(), time)?;
    written.push(entry.file_name().to_string_lossy().to_string());
  }

  let mut file = writer.finish()?;
  file.flush()?;
  file.sync_all()?;

  debug!(dir = %dir.display(), dest = %dest.display(), entries = written.len(), "created archive");
  Ok(written)
}

fn base_name(name: &str) -> Result<&str, ArchiveError> {
  match Path::new(name).file_name().and_then(|n| n.to_str()) {
    Some(base) if !name.ends_with('/') => Ok(base),
    _ => Err(ArchiveError::InvalidName(name.to_string())),
  }
}

/// Convert a filesystem timestamp to a zip timestamp in UTC, clamped to the zip epoch.
fn zip_time(time: SystemTime) -> zip::DateTime {
  let utc: DateTime<Utc> = time.into();
  zip::DateTime::from_date_and_time(
    utc.year().clamp(1980, 2107) as u16,
    utc.month() as u8,
    utc.day() as u8,
    utc.hour() as u8,
    utc.minute() as u8,
    utc.second() as u8,
  )
  .unwrap_or_default()
}
