/// Name of the verifier; first component of every cache path.
pub const APP_NAME: &str = "repro";

/// Shell used to run build instructions unless overridden.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Host serving source archives for remote verification.
pub const DEFAULT_SOURCE_HOST: &str = "https://github.com";

pub const TARGET_DIR_NAME: &str = "dist";
pub const ZIP_DIR_NAME: &str = "out";
pub const META_DIR_NAME: &str = "meta";

/// Suffix stripped from the product name to form its core name.
pub const ENTERPRISE_SUFFIX: &str = "-enterprise";
