use serde::{Deserialize, Serialize};

use super::platform::{host_arch, host_os};
use super::{ConfigError, Product, require_file_name};

/// Build inputs that must be identical for two builds to be the same build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameters {
  #[serde(rename = "GoVersion")]
  pub go_version: String,
  #[serde(rename = "OS")]
  pub os: String,
  #[serde(rename = "Arch")]
  pub arch: String,
  #[serde(rename = "ZipName")]
  pub zip_name: String,
  /// Shell script run to produce the executable.
  #[serde(rename = "Instructions")]
  pub instructions: String,
}

impl Parameters {
  /// Fill the target platform and archive name from the host and `product`.
  ///
  /// `product` must already be initialized.
  pub fn init(self, product: &Product) -> Result<Self, ConfigError> {
    if self.instructions.trim().is_empty() {
      return Err(ConfigError::Missing("instructions"));
    }

    let os = if self.os.is_empty() { host_os() } else { self.os };
    let arch = if self.arch.is_empty() { host_arch() } else { self.arch };
    let zip_name = if self.zip_name.is_empty() {
      default_zip_name(product, &os, &arch)
    } else {
      self.zip_name
    };
    require_file_name("zip name", &zip_name)?;

    Ok(Self {
      go_version: self.go_version,
      os,
      arch,
      zip_name,
      instructions: self.instructions,
    })
  }

  pub fn is_windows(&self) -> bool {
    self.os == "windows"
  }
}

/// `<name>_<version>_<os>_<arch>.zip`
pub fn default_zip_name(product: &Product, os: &str, arch: &str) -> String {
  format!("{}_{}_{}_{}.zip", product.name, product.version.full, os, arch)
}
