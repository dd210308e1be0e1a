//! Implementation of the `repro env` command.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use repro_lib::config::{Config, Tool};
use repro_lib::env;

use crate::output::{OutputFormat, print_json};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Var<'a> {
  name: &'a str,
  value: &'a str,
}

/// Print the projection and append it to `GITHUB_ENV` when that is set.
pub fn cmd_env(invariant: bool, format: OutputFormat) -> Result<bool> {
  let config = Config::from_env(Tool::current()).context("Failed to resolve build config")?;
  let vars = if invariant {
    env::invariant(&config)
  } else {
    env::project(&config)
  };

  if format.is_json() {
    let list: Vec<_> = vars
      .iter()
      .map(|v| Var {
        name: v.name,
        value: &v.value,
      })
      .collect();
    print_json(&list)?;
  } else {
    print!("{}", env::render(&vars));
  }

  if env::append_to_github_env(&vars).context("Failed to write GITHUB_ENV")? {
    info!(count = vars.len(), "appended to GITHUB_ENV");
  }
  Ok(true)
}
