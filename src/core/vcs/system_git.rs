//! System git backend
//!
//! Every operation shells out to the `git` binary with an isolated
//! environment, so user-level config cannot change the behaviour of a run.

use crate::core::error::{GitError, ResultExt, TseiError, TseiResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Environment variables passed through to git; everything else is cleared
const PASSTHROUGH_ENV: &[&str] = &["PATH", "HOME", "SSH_AUTH_SOCK", "GIT_SSH_COMMAND", "GIT_ASKPASS"];

/// Git backend using system git
#[derive(Debug, Clone)]
pub struct SystemGit {
  /// Directory every command runs in
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open an existing git repository
  pub fn open(path: &Path) -> TseiResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") || !path.exists() {
        return Err(TseiError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(TseiError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Run commands in `path` without requiring a repository there yet
  /// (for `clone` into an empty scratch directory)
  pub fn at(path: &Path) -> Self {
    Self {
      repo_path: path.to_path_buf(),
      work_tree: path.to_path_buf(),
    }
  }

  /// Initialize an empty repository in `path`
  pub fn init(path: &Path) -> TseiResult<Self> {
    let git = Self::at(path);
    git.run(&["init", "--quiet"])?;
    Ok(git)
  }

  /// Working tree root
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> TseiResult<String> {
    let stdout = self.run(&["rev-parse", "HEAD"])?;
    Ok(stdout.trim().to_string())
  }

  /// Run a git command, returning stdout or a `CommandFailed` error
  pub(crate) fn run(&self, args: &[&str]) -> TseiResult<String> {
    let output = self.output(args)?;
    if !output.status.success() {
      return Err(TseiError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }
    Ok(String::from_utf8(output.stdout)?)
  }

  /// Run a git command and hand back the raw output for callers that inspect
  /// the exit status themselves
  pub(crate) fn output(&self, args: &[&str]) -> TseiResult<Output> {
    debug!(cwd = %self.repo_path.display(), "git {}", args.join(" "));
    self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.first().copied().unwrap_or_default()))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only the variables needed to reach remotes
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    cmd.env_clear();
    for key in PASSTHROUGH_ENV {
      if let Ok(value) = std::env::var(key) {
        cmd.env(key, value);
      }
    }

    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_open_outside_repo_fails() {
    let dir = TempDir::new().unwrap();
    let err = SystemGit::open(&dir.path().join("missing")).err().unwrap();
    assert!(matches!(err, TseiError::Git(GitError::RepoNotFound { .. })));
  }

  #[test]
  fn test_init_then_open() {
    let dir = TempDir::new().unwrap();
    SystemGit::init(dir.path()).unwrap();
    let git = SystemGit::open(dir.path()).unwrap();
    assert!(git.work_tree().exists());
    assert!(git.head_commit().is_err());
  }
}
