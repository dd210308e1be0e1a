use super::step::{CORE_STEPS, Step};
use super::Settings;
use crate::config::Config;

/// The reference build, run in the caller's working tree.
#[derive(Debug, Clone)]
pub struct Primary {
  config: Config,
  settings: Settings,
}

impl Primary {
  pub fn new(config: Config, settings: Settings) -> Self {
    Self { config, settings }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn steps(&self) -> Vec<Step> {
    CORE_STEPS.to_vec()
  }
}
