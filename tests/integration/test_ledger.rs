//! Ledger persistence against a real git repository

use crate::helpers::TestWorkspace;
use anyhow::Result;
use tsei::core::error::{GitError, TseiError};
use tsei::core::vcs::SystemGit;
use tsei::release::ledger::Ledger;
use tsei::release::store::{self, COMMIT_MESSAGE, SaveOutcome};

fn load(ws: &TestWorkspace) -> Result<Ledger> {
  Ok(store::load(&ws.path.join("tsei-ledger.json"))?)
}

#[test]
fn test_save_commits_only_real_changes() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_ledger("*", &["v0.9.0"], 3, "https://example.invalid/compiler.git")?;
  let initial = ws.commit("Add ledger")?;
  let path = ws.path.join("tsei-ledger.json");
  let git = SystemGit::open(&ws.path)?;

  let mut ledger = load(&ws)?;
  ledger.record_attempt("v1.0.0");

  let outcome = store::save(&ledger, &path, Some(&git))?;
  let head = match outcome {
    SaveOutcome::Committed { head } => head,
    other => panic!("expected a commit, got {:?}", other),
  };
  assert_ne!(head, initial);
  assert_eq!(ws.head()?, head);
  assert_eq!(ws.git_log(1)?, vec![COMMIT_MESSAGE]);

  // Same content again: nothing to commit
  assert_eq!(store::save(&ledger, &path, Some(&git))?, SaveOutcome::Unchanged);
  assert_eq!(ws.head()?, head);

  ledger.mark_complete("v1.0.0", "1.0.0");
  assert!(matches!(
    store::save(&ledger, &path, Some(&git))?,
    SaveOutcome::Committed { .. }
  ));
  assert_ne!(ws.head()?, head);
  assert_eq!(ws.git_log(2)?, vec![COMMIT_MESSAGE, COMMIT_MESSAGE]);
  Ok(())
}

#[test]
fn test_saved_ledger_round_trips_through_disk() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_ledger("^5.0.0", &["v5.0-skip"], 2, "https://example.invalid/compiler.git")?;
  let path = ws.path.join("tsei-ledger.json");

  let mut ledger = load(&ws)?;
  ledger.record_attempt("v5.1.0");
  ledger.set_resolved_version("v5.1.0", "5.1.0");
  assert_eq!(store::save(&ledger, &path, None)?, SaveOutcome::Written);

  let raw = ws.read_ledger()?;
  assert_eq!(raw["settings"]["acceptedVersionRange"], "^5.0.0");
  assert_eq!(raw["settings"]["skipTags"][0], "v5.0-skip");
  assert_eq!(raw["records"][0]["resolvedVersion"], "5.1.0");
  assert!(raw["records"][0]["lastAttemptTime"].is_string());
  assert!(ws.read_file("tsei-ledger.json")?.ends_with("}\n"));

  let reloaded = load(&ws)?;
  assert_eq!(reloaded.records, ledger.records);
  Ok(())
}

#[test]
fn test_load_missing_ledger_is_fatal() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let err = store::load(&ws.path.join("tsei-ledger.json")).unwrap_err();
  assert!(matches!(err, TseiError::Config(_)));
  assert!(err.to_string().contains("Ledger file not found"));
  Ok(())
}

#[test]
fn test_load_malformed_ledger_is_fatal() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("tsei-ledger.json", "{ \"settings\": ")?;
  let err = store::load(&ws.path.join("tsei-ledger.json")).unwrap_err();
  assert!(err.to_string().contains("is invalid"));

  ws.write_ledger("not a range", &[], 3, "https://example.invalid/compiler.git")?;
  let err = store::load(&ws.path.join("tsei-ledger.json")).unwrap_err();
  assert!(err.to_string().contains("is invalid"));
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_commit_that_leaves_head_in_place_is_fatal() -> Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let ws = TestWorkspace::new()?;
  ws.write_ledger("*", &[], 3, "https://example.invalid/compiler.git")?;
  let initial = ws.commit("Add ledger")?;

  // Undo every commit as soon as it lands
  let hook = ws.path.join(".git/hooks/post-commit");
  std::fs::write(&hook, "#!/bin/sh\ngit reset --soft HEAD~1\n")?;
  std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755))?;

  let path = ws.path.join("tsei-ledger.json");
  let git = SystemGit::open(&ws.path)?;
  let mut ledger = load(&ws)?;
  ledger.record_attempt("v1.0.0");

  let err = store::save(&ledger, &path, Some(&git)).unwrap_err();
  assert!(
    matches!(err, TseiError::Git(GitError::CommitNotRecorded { ref head, .. }) if *head == initial),
    "{:?}",
    err
  );
  assert_eq!(ws.head()?, initial);
  Ok(())
}
