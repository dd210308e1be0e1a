//! Builds: an ordered list of steps run against a [`Config`].
//!
//! Every variant runs the same core steps (validate, create dirs, write and
//! run the instructions, check the executable, normalize mtimes, archive).
//! Verification variants prepend steps that prepare an isolated work dir.

mod common;
mod error;
mod exec;
mod fetch;
mod local;
mod primary;
mod remote;
pub mod result;
pub mod runner;
mod settings;
mod step;

pub use error::BuildError;
pub use local::{LocalVerification, start_after};
pub use primary::Primary;
pub use remote::RemoteBuild;
pub use result::{BuildResult, BuildState, FileRecord, Meta, ResultFileError};
pub use settings::{OutputSink, Settings, SettingsBuilder};
pub use step::{CORE_STEPS, Step};

use crate::cache::BuildKind;
use crate::config::Config;

#[derive(Debug, Clone)]
pub enum Build {
  Primary(Primary),
  LocalVerification(LocalVerification),
  Remote(RemoteBuild),
}

impl Build {
  pub fn kind(&self) -> BuildKind {
    match self {
      Self::Primary(_) => BuildKind::Primary,
      Self::LocalVerification(_) | Self::Remote(_) => BuildKind::Verification,
    }
  }

  pub fn config(&self) -> &Config {
    match self {
      Self::Primary(b) => b.config(),
      Self::LocalVerification(b) => b.config(),
      Self::Remote(b) => b.config(),
    }
  }

  pub fn settings(&self) -> &Settings {
    match self {
      Self::Primary(b) => b.settings(),
      Self::LocalVerification(b) => b.settings(),
      Self::Remote(b) => b.settings(),
    }
  }

  pub fn steps(&self) -> Vec<Step> {
    match self {
      Self::Primary(b) => b.steps(),
      Self::LocalVerification(b) => b.steps(),
      Self::Remote(b) => b.steps(),
    }
  }

  pub async fn run(&self) -> BuildResult {
    runner::run(self).await
  }
}

impl From<Primary> for Build {
  fn from(build: Primary) -> Self {
    Self::Primary(build)
  }
}

impl From<LocalVerification> for Build {
  fn from(build: LocalVerification) -> Self {
    Self::LocalVerification(build)
  }
}

impl From<RemoteBuild> for Build {
  fn from(build: RemoteBuild) -> Self {
    Self::Remote(build)
  }
}
