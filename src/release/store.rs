//! Ledger persistence
//!
//! Stateless: every call takes the ledger and its location explicitly.

use crate::core::error::{ConfigError, GitError, ResultExt, TseiError, TseiResult};
use crate::core::vcs::SystemGit;
use crate::release::ledger::Ledger;
use crate::release::pipeline::{LedgerStore, RemotePush};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Commit message used for ledger updates
pub const COMMIT_MESSAGE: &str = "chore(storage): Updated storage";

/// What a save did beyond writing the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
  /// Written, no commit requested
  Written,
  /// Commit requested but the file matched the index, so nothing was committed
  Unchanged,
  /// Written and committed
  Committed { head: String },
}

/// Load the ledger at `path`
///
/// A missing or unreadable ledger is fatal; nothing is ever inferred.
pub fn load(path: &Path) -> TseiResult<Ledger> {
  if !path.exists() {
    return Err(TseiError::Config(ConfigError::LedgerNotFound {
      path: path.to_path_buf(),
    }));
  }

  let content = fs::read_to_string(path).with_context(|| format!("Failed to read ledger from {}", path.display()))?;
  let ledger: Ledger = serde_json::from_str(&content).map_err(|e| {
    TseiError::Config(ConfigError::LedgerInvalid {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })
  })?;

  ledger.settings.validate().map_err(|e| {
    TseiError::Config(ConfigError::LedgerInvalid {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })
  })?;

  debug!(path = %path.display(), records = ledger.records.len(), "loaded ledger");
  Ok(ledger)
}

/// Write `ledger` to `path` as pretty JSON, then optionally commit it
///
/// With `commit`, HEAD is compared before and after committing; a commit that
/// leaves HEAD where it was is a consistency failure.
pub fn save(ledger: &Ledger, path: &Path, commit: Option<&SystemGit>) -> TseiResult<SaveOutcome> {
  let mut content = serde_json::to_string_pretty(ledger)?;
  content.push('\n');
  fs::write(path, content).with_context(|| format!("Failed to write ledger to {}", path.display()))?;
  info!("Saved ledger to {}", path.display());

  let Some(git) = commit else {
    return Ok(SaveOutcome::Written);
  };

  if git.status_porcelain(path)?.is_empty() {
    info!("Ledger unchanged, nothing to commit");
    return Ok(SaveOutcome::Unchanged);
  }

  // An unborn HEAD has no SHA yet; any successful commit moves it
  let before = git.head_commit().ok();

  git.add(path)?;
  git.commit(COMMIT_MESSAGE)?;

  let after = git.head_commit()?;
  if before.as_deref() == Some(after.as_str()) {
    return Err(TseiError::Git(GitError::CommitNotRecorded {
      path: path.to_path_buf(),
      head: after,
    }));
  }

  info!("Committed ledger as {}", after);
  Ok(SaveOutcome::Committed { head: after })
}

/// Ledger file on disk, committed through system git when asked
pub struct FileLedgerStore {
  path: PathBuf,
  git: Option<SystemGit>,
}

impl FileLedgerStore {
  pub fn new(path: PathBuf, git: Option<SystemGit>) -> Self {
    Self { path, git }
  }
}

impl LedgerStore for FileLedgerStore {
  fn save(&self, ledger: &Ledger, commit: bool) -> TseiResult<SaveOutcome> {
    let git = match (&self.git, commit) {
      (Some(git), true) => Some(git),
      (None, true) => {
        return Err(TseiError::Git(GitError::RepoNotFound {
          path: self.path.clone(),
        }));
      }
      (_, false) => None,
    };
    save(ledger, &self.path, git)
  }
}

/// Pushes the repository holding the ledger
pub struct GitRemote {
  git: SystemGit,
}

impl GitRemote {
  pub fn new(git: SystemGit) -> Self {
    Self { git }
  }
}

impl RemotePush for GitRemote {
  fn push(&self) -> TseiResult<()> {
    info!("Pushing {}", self.git.work_tree().display());
    self.git.push()
  }
}
