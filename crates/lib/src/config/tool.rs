use serde::{Deserialize, Serialize};

use crate::consts::APP_NAME;

/// Identity of the verifier binary itself; part of every cache path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tool {
  pub name: String,
  pub version: String,
  pub revision: String,
}

impl Tool {
  pub fn new(name: impl Into<String>, version: impl Into<String>, revision: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      revision: revision.into(),
    }
  }

  /// The identity of this build of the library.
  ///
  /// The revision comes from `REPRO_REVISION` at compile time when set.
  pub fn current() -> Self {
    Self::new(
      APP_NAME,
      env!("CARGO_PKG_VERSION"),
      option_env!("REPRO_REVISION").unwrap_or("unknown"),
    )
  }
}

impl Default for Tool {
  fn default() -> Self {
    Self::current()
  }
}

impl std::fmt::Display for Tool {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} v{} ({})", self.name, self.version, self.revision)
  }
}
