//! repro-lib: reproducible-build verification engine.
//!
//! This crate builds a product from a shell script of instructions, rebuilds it
//! independently, and compares the two results byte-for-byte:
//! - `config`: product identity, invariant build parameters, and host paths
//! - `build`: the step runner and the primary, local, and remote build variants
//! - `manager`: on-disk caching of build results keyed by source hash
//! - `verify`: loading two results and comparing their artifacts
//! - `archive`: the deterministic flat zip writer and a traversal-safe extractor

pub mod archive;
pub mod build;
pub mod cache;
pub mod config;
pub mod consts;
pub mod env;
pub mod error;
pub mod git;
pub mod manager;
pub mod util;
pub mod verify;

pub use error::ErrorKind;
