//! The record a build leaves behind.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::BuildError;
use crate::config::Config;
use crate::error::ErrorKind;
use crate::util::fs::atomic_write;
use crate::util::hash::sha256_hex;

/// Stat and digest of one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileRecord {
  /// Base name.
  pub name: String,
  pub original_path: PathBuf,
  pub size: u64,
  #[serde(rename = "SHA256Sum")]
  pub sha256_sum: String,
}

impl FileRecord {
  pub fn from_path(path: &Path) -> Result<Self, BuildError> {
    let metadata = std::fs::metadata(path)?;
    Ok(Self {
      name: path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default(),
      original_path: path.to_path_buf(),
      size: metadata.len(),
      sha256_sum: sha256_hex(path)?,
    })
  }

  pub fn is_populated(&self) -> bool {
    !self.sha256_sum.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Meta {
  pub start: DateTime<Utc>,
  pub finish: DateTime<Utc>,
  #[serde(with = "seconds")]
  pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
  Pending,
  Running,
  Succeeded,
  Failed,
}

/// Outcome of one build. `successful` holds iff there is no error message
/// and both artifacts were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildResult {
  pub config: Config,
  /// The `NAME=VALUE` environment given to the instructions.
  pub env: Vec<String>,
  pub meta: Meta,
  pub zip: FileRecord,
  pub executable: FileRecord,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub error_message: String,
  pub successful: bool,
}

impl BuildResult {
  pub fn new(config: Config) -> Self {
    Self {
      config,
      ..Default::default()
    }
  }

  /// The recorded error, if the build failed.
  pub fn error(&self) -> Option<&str> {
    (!self.error_message.is_empty()).then_some(self.error_message.as_str())
  }

  pub fn state(&self) -> BuildState {
    if self.successful {
      BuildState::Succeeded
    } else if self.error().is_some() {
      BuildState::Failed
    } else if self.meta.start != DateTime::<Utc>::default() {
      BuildState::Running
    } else {
      BuildState::Pending
    }
  }

  pub(crate) fn start(&mut self, at: DateTime<Utc>) {
    self.meta.start = at;
  }

  pub(crate) fn fail(&mut self, message: String) {
    self.error_message = message;
  }

  pub(crate) fn finish(&mut self, at: DateTime<Utc>) {
    self.meta.finish = at;
    self.meta.duration = (at - self.meta.start).to_std().unwrap_or_default();
    self.successful = self.error_message.is_empty() && self.executable.is_populated() && self.zip.is_populated();
    if !self.successful && self.error_message.is_empty() {
      self.error_message = "artifacts were not recorded".to_string();
    }
  }

  pub fn read_json(path: &Path) -> Result<Self, ResultFileError> {
    let data = std::fs::read(path).map_err(|source| ResultFileError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(path, &data)
  }

  pub(crate) fn from_json(path: &Path, data: &[u8]) -> Result<Self, ResultFileError> {
    serde_json::from_slice(data).map_err(|source| ResultFileError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Write pretty JSON atomically.
  pub fn write_json(&self, path: &Path) -> Result<(), ResultFileError> {
    write_json(path, self)
  }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ResultFileError> {
  let mut data = serde_json::to_vec_pretty(value).map_err(|source| ResultFileError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  data.push(b'\n');
  atomic_write(path, &data).map_err(|source| ResultFileError::Write {
    path: path.to_path_buf(),
    source,
  })
}

#[derive(Debug, Error)]
pub enum ResultFileError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl ResultFileError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Parse { .. } => ErrorKind::InvalidInput,
      Self::Read { .. } | Self::Write { .. } => ErrorKind::Io,
    }
  }
}

/// Durations as decimal seconds, e.g. `"1.234s"`, exact to the nanosecond.
pub mod seconds {
  use std::time::Duration;

  use serde::{Deserialize, Deserializer, Serializer, de};

  pub fn format(d: &Duration) -> String {
    let nanos = d.subsec_nanos();
    if nanos == 0 {
      return format!("{}s", d.as_secs());
    }
    let frac = format!("{:09}", nanos);
    format!("{}.{}s", d.as_secs(), frac.trim_end_matches('0'))
  }

  pub fn parse(s: &str) -> Option<Duration> {
    let body = s.strip_suffix('s')?;
    let (secs, frac) = body.split_once('.').unwrap_or((body, ""));
    if secs.is_empty() || frac.len() > 9 || !secs.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
      return None;
    }
    let secs: u64 = secs.parse().ok()?;
    let nanos: u32 = if frac.is_empty() {
      0
    } else {
      format!("{:0<9}", frac).parse().ok()?
    };
    Some(Duration::new(secs, nanos))
  }

  pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(d))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse(&s).ok_or_else(|| de::Error::custom(format!("invalid duration {:?}", s)))
  }
}
