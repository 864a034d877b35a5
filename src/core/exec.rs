//! External command execution
//!
//! Build and publish steps run upstream tooling (`npm`, `npx`, ...) whose
//! output is only interesting when it fails, so stdout and stderr are
//! captured and attached to the error.

use crate::core::error::{TseiError, TseiResult};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Run `argv` in `cwd`, returning stdout
pub fn run_command(argv: &[String], cwd: &Path) -> TseiResult<String> {
  let (program, args) = argv
    .split_first()
    .ok_or_else(|| TseiError::message("Cannot run an empty command"))?;
  let command_line = argv.join(" ");

  debug!(cwd = %cwd.display(), "{}", command_line);

  let output = Command::new(program)
    .args(args)
    .current_dir(cwd)
    .output()
    .map_err(|e| TseiError::message(format!("Failed to execute {}: {}", program, e)))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() { stdout } else { stderr };
    return Err(TseiError::message(format!(
      "{} failed with exit code {}\n{}",
      command_line,
      output.status.code().unwrap_or(-1),
      detail.trim()
    )));
  }

  Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
