mod build;
mod env;
mod inspect;
mod verify;

pub use build::cmd_build;
pub use env::cmd_env;
pub use inspect::cmd_inspect;
pub use verify::{VerifyArgs, cmd_verify};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use repro_lib::build::{OutputSink, Settings};

/// A runtime plus a cancellation token that fires on Ctrl-C.
fn runtime() -> Result<(tokio::runtime::Runtime, CancellationToken)> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let token = CancellationToken::new();
  let on_signal = token.clone();
  rt.spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupted, cancelling");
      on_signal.cancel();
    }
  });
  Ok((rt, token))
}

/// Instruction output goes to stderr so stdout stays parseable.
fn settings(token: CancellationToken, rebuild: bool) -> Settings {
  Settings::builder()
    .cancel_token(token)
    .output(OutputSink::Stderr)
    .force_rebuild(rebuild)
    .build()
}
