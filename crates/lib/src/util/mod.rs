//! Shared utilities.
//!
//! Streaming SHA-256 digests, filesystem helpers, and test helpers.

pub mod fs;
pub mod hash;

#[cfg(test)]
pub mod testutil;
