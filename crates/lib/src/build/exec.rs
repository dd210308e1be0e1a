//! Running the build instructions in a subprocess.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{BuildError, Settings};

/// Run `script` with the configured shell in `cwd`.
///
/// The child inherits the current environment with `env` layered on top. It
/// is killed if the settings' cancellation token fires first.
pub async fn run_script<I, K, V>(script: &Path, cwd: &Path, env: I, settings: &Settings) -> Result<(), BuildError>
where
  I: IntoIterator<Item = (K, V)>,
  K: AsRef<OsStr>,
  V: AsRef<OsStr>,
{
  let shell = settings.shell();
  let cmd = format!("{} {}", shell.display(), script.display());
  info!(cmd = %cmd, cwd = %cwd.display(), "running instructions");

  let mut command = Command::new(shell);
  command
    .arg(script)
    .current_dir(cwd)
    .envs(env)
    .stdin(Stdio::null())
    .stdout(settings.stdout().stdio()?)
    .stderr(settings.stderr().stdio()?)
    .kill_on_drop(true);

  let mut child = command.spawn()?;
  debug!(pid = ?child.id(), "spawned process");

  let status = tokio::select! {
    status = child.wait() => status?,
    _ = settings.cancel_token().cancelled() => {
      warn!(cmd = %cmd, "cancelled, killing process");
      if let Err(e) = child.kill().await {
        debug!(error = %e, "kill failed");
      }
      return Err(BuildError::Cancelled);
    }
  };

  if !status.success() {
    return Err(BuildError::ExecFailed {
      cmd,
      code: status.code(),
    });
  }
  Ok(())
}
