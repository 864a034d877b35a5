//! Additional operations for SystemGit (staging, commits, remotes, tags)

use super::system_git::SystemGit;
use crate::core::error::{GitError, TseiError, TseiResult};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

impl SystemGit {
  /// Porcelain status lines for a single path (empty when unchanged)
  pub fn status_porcelain(&self, path: &Path) -> TseiResult<String> {
    let path = path.to_string_lossy();
    let stdout = self.run(&["status", "--porcelain", "--", &path])?;
    Ok(stdout.trim().to_string())
  }

  /// Stage a path
  pub fn add(&self, path: &Path) -> TseiResult<()> {
    let path = path.to_string_lossy();
    self.run(&["add", "--", &path])?;
    Ok(())
  }

  /// Commit staged changes with `message`
  pub fn commit(&self, message: &str) -> TseiResult<()> {
    self.run(&["commit", "-m", message])?;
    Ok(())
  }

  /// Push the current branch to its upstream
  pub fn push(&self) -> TseiResult<()> {
    let output = self.output(&["push"])?;
    if !output.status.success() {
      return Err(TseiError::Git(GitError::PushFailed {
        reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }
    Ok(())
  }

  /// Add a remote to the repository
  pub fn add_remote(&self, name: &str, url: &str) -> TseiResult<()> {
    self.run(&["remote", "add", name, url])?;
    Ok(())
  }

  /// List tag names on `remote`, sorted and deduplicated
  ///
  /// Peeled entries (`refs/tags/v1.0.0^{}`) collapse into their tag.
  pub fn ls_remote_tags(&self, remote: &str) -> TseiResult<Vec<String>> {
    let stdout = self.run(&["ls-remote", "--tags", remote])?;
    let tags = parse_ls_remote_tags(&stdout);
    debug!(remote, count = tags.len(), "listed remote tags");
    Ok(tags)
  }

  /// Shallow-clone a single tag of `url` into this (empty) working tree
  pub fn clone_tag(&self, url: &str, tag: &str) -> TseiResult<()> {
    self.run(&["clone", "--depth", "1", "--branch", tag, "--no-tags", url, "."])?;
    Ok(())
  }
}

/// Extract tag names from `git ls-remote --tags` output
pub(crate) fn parse_ls_remote_tags(stdout: &str) -> Vec<String> {
  let tags: BTreeSet<String> = stdout
    .lines()
    .filter_map(|line| line.split_once("refs/tags/"))
    .filter_map(|(_, rest)| rest.split_whitespace().next())
    .map(|name| name.trim_end_matches("^{}").to_string())
    .collect();
  tags.into_iter().collect()
}
