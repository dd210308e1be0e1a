//! Fixtures shared by unit tests.

use std::path::Path;

use crate::config::{Config, Parameters, Product, Tool, Version};

/// A fixed tool identity so cache paths do not depend on the crate version.
pub fn tool() -> Tool {
  Tool::new("repro", "0.0.0-test", "deadbeef")
}

pub fn lockbox_product() -> Product {
  Product {
    name: "lockbox".to_string(),
    version: Version::parse("1.2.3"),
    revision: "cabba9e".to_string(),
    revision_time: "2022-07-04T11:33:33Z".to_string(),
    ..Default::default()
  }
}

pub fn lockbox_parameters(instructions: &str) -> Parameters {
  Parameters {
    go_version: "1.18".to_string(),
    os: "linux".to_string(),
    arch: "amd64".to_string(),
    instructions: instructions.to_string(),
    ..Default::default()
  }
}

/// An initialized lockbox 1.2.3 config rooted at `root`.
pub fn lockbox_config(root: &Path, instructions: &str) -> Config {
  Config::new(lockbox_product(), lockbox_parameters(instructions), root, tool()).unwrap()
}
