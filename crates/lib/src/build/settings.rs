//! Execution settings shared by every step of a build.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio_util::sync::CancellationToken;

use crate::consts::DEFAULT_SHELL;

/// Where a subprocess stream goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputSink {
  #[default]
  Inherit,
  /// The parent's stderr, keeping stdout free for machine-readable output.
  Stderr,
  Null,
  /// Appended to the file, which is created if missing.
  File(PathBuf),
}

impl OutputSink {
  pub fn stdio(&self) -> std::io::Result<Stdio> {
    Ok(match self {
      Self::Inherit => Stdio::inherit(),
      Self::Stderr => Stdio::from(std::io::stderr()),
      Self::Null => Stdio::null(),
      Self::File(path) => Stdio::from(OpenOptions::new().create(true).append(true).open(path)?),
    })
  }
}

/// Frozen execution settings. Build one with [`Settings::builder`].
#[derive(Debug, Clone)]
pub struct Settings {
  shell: PathBuf,
  cancel: CancellationToken,
  stdout: OutputSink,
  stderr: OutputSink,
  force_rebuild: bool,
}

impl Settings {
  pub fn builder() -> SettingsBuilder {
    SettingsBuilder::default()
  }

  pub fn shell(&self) -> &Path {
    &self.shell
  }

  pub fn cancel_token(&self) -> &CancellationToken {
    &self.cancel
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancel.is_cancelled()
  }

  pub fn stdout(&self) -> &OutputSink {
    &self.stdout
  }

  pub fn stderr(&self) -> &OutputSink {
    &self.stderr
  }

  pub fn force_rebuild(&self) -> bool {
    self.force_rebuild
  }
}

impl Default for Settings {
  fn default() -> Self {
    Self::builder().build()
  }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
  shell: Option<PathBuf>,
  cancel: Option<CancellationToken>,
  stdout: OutputSink,
  stderr: OutputSink,
  force_rebuild: bool,
}

impl SettingsBuilder {
  pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
    self.shell = Some(shell.into());
    self
  }

  pub fn cancel_token(mut self, token: CancellationToken) -> Self {
    self.cancel = Some(token);
    self
  }

  pub fn stdout(mut self, sink: OutputSink) -> Self {
    self.stdout = sink;
    self
  }

  pub fn stderr(mut self, sink: OutputSink) -> Self {
    self.stderr = sink;
    self
  }

  /// Send both streams to `sink`.
  pub fn output(self, sink: OutputSink) -> Self {
    self.stdout(sink.clone()).stderr(sink)
  }

  pub fn force_rebuild(mut self, force: bool) -> Self {
    self.force_rebuild = force;
    self
  }

  pub fn build(self) -> Settings {
    Settings {
      shell: self.shell.unwrap_or_else(|| PathBuf::from(DEFAULT_SHELL)),
      cancel: self.cancel.unwrap_or_default(),
      stdout: self.stdout,
      stderr: self.stderr,
      force_rebuild: self.force_rebuild,
    }
  }
}
