//! Build configuration: what is built, how, and where.
//!
//! A [`Config`] is a strict tree of values. [`Product`] and [`Parameters`] are
//! invariant between a primary and a verification build, [`Paths`] are host
//! specific, and [`Tool`] identifies the verifier itself.

mod error;
mod options;
mod parameters;
mod paths;
pub mod platform;
mod product;
mod tool;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use options::ConfigOptions;
pub use parameters::{Parameters, default_zip_name};
pub use paths::{Paths, executable_name};
pub use product::{Product, Version};
pub use tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
  pub product: Product,
  pub parameters: Parameters,
  pub paths: Paths,
  pub tool: Tool,
}

impl Config {
  /// Initialize `product` and `parameters` and derive paths under `work_dir`.
  pub fn new(
    product: Product,
    parameters: Parameters,
    work_dir: impl Into<PathBuf>,
    tool: Tool,
  ) -> Result<Self, ConfigError> {
    let product = product.init()?;
    let parameters = parameters.init(&product)?;
    let product = Product {
      executable_name: executable_name(&product.executable_name, &parameters.os),
      ..product
    };
    let paths = Paths::new(work_dir, &product.executable_name, &parameters.zip_name)?;

    Ok(Self {
      product,
      parameters,
      paths,
      tool,
    })
  }

  /// Re-run defaulting and path derivation. Idempotent.
  pub fn init(self) -> Result<Self, ConfigError> {
    Self::new(self.product, self.parameters, self.paths.work_dir, self.tool)
  }

  /// The same build rooted somewhere else.
  pub fn with_work_dir(&self, work_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
    Ok(Self {
      paths: Paths::new(work_dir, &self.product.executable_name, &self.parameters.zip_name)?,
      ..self.clone()
    })
  }

  /// Read the environment and the worktree at the primary root.
  pub fn from_env(tool: Tool) -> Result<Self, ConfigError> {
    ConfigOptions::from_env().into_config(tool)
  }
}

/// Reject anything but a single normal path component.
pub(crate) fn require_file_name(field: &'static str, name: &str) -> Result<(), ConfigError> {
  let mut components = std::path::Path::new(name).components();
  match (components.next(), components.next()) {
    (Some(std::path::Component::Normal(part)), None) if part == std::ffi::OsStr::new(name) => Ok(()),
    _ => Err(ConfigError::invalid(field, format!("{:?} is not a plain file name", name))),
  }
}
