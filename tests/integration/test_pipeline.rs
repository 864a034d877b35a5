//! Integration tests for the release pipeline against real git repositories

use crate::helpers::{BROKEN_DECLARATIONS, TEST_CONFIG, TestWorkspace, UpstreamRepo, VALID_DECLARATIONS};
use anyhow::Result;
use std::cell::RefCell;
use tempfile::TempDir;
use tsei::core::config::TseiConfig;
use tsei::core::error::{TseiError, TseiResult};
use tsei::core::vcs::SystemGit;
use tsei::decl::DeclarationTransformer;
use tsei::release::pipeline::{Publisher, ReleasePipeline, TagOutcome, TagSource};
use tsei::release::store::{self, COMMIT_MESSAGE, FileLedgerStore, GitRemote, SaveOutcome};
use tsei::release::{CommandBuilder, DistTag, GitTagLister, PublishRequest};

/// Records requests instead of talking to a registry
#[derive(Default)]
struct RecordingPublisher {
  requests: RefCell<Vec<PublishRequest>>,
}

impl Publisher for RecordingPublisher {
  fn publish(&self, request: &PublishRequest) -> TseiResult<()> {
    if request.declarations.contains("declare namespace ts") {
      return Err(TseiError::message("untransformed declarations"));
    }
    self.requests.borrow_mut().push(request.clone());
    Ok(())
  }
}

struct Harness {
  ws: TestWorkspace,
  upstream: UpstreamRepo,
  scratch: TempDir,
  config: TseiConfig,
}

impl Harness {
  fn new() -> Result<Self> {
    Ok(Self {
      ws: TestWorkspace::new()?,
      upstream: UpstreamRepo::new()?,
      scratch: TempDir::new()?,
      config: TseiConfig::parse(TEST_CONFIG)?,
    })
  }

  fn run(&self, publisher: &RecordingPublisher, dry_run: bool) -> TseiResult<tsei::release::RunSummary> {
    let ledger_path = self.ws.path.join("tsei-ledger.json");
    let mut ledger = store::load(&ledger_path)?;

    let git = SystemGit::open(&self.ws.path)?;
    let tags = GitTagLister::new(self.scratch.path().to_path_buf());
    let builder = CommandBuilder::new(self.config.build.clone(), self.config.exposure.clone());
    let store = FileLedgerStore::new(ledger_path, Some(git.clone()));
    let remote = GitRemote::new(git);

    let pipeline = ReleasePipeline {
      tags: &tags,
      builder: &builder,
      publisher,
      store: &store,
      remote: &remote,
      transformer: DeclarationTransformer::default(),
      scratch_root: self.scratch.path().to_path_buf(),
      dry_run,
    };
    pipeline.execute(&mut ledger)
  }
}

#[test]
fn test_git_tag_lister_reads_local_remote() -> Result<()> {
  let upstream = UpstreamRepo::new()?;
  upstream.release("v1.0.0", "1.0.0", VALID_DECLARATIONS)?;
  upstream.release("v1.1-beta", "1.1.0-beta", VALID_DECLARATIONS)?;

  let scratch = TempDir::new()?;
  let tags = GitTagLister::new(scratch.path().to_path_buf()).list_tags(&upstream.url())?;

  assert_eq!(tags, vec!["v1.0.0", "v1.1-beta"]);
  assert_eq!(std::fs::read_dir(scratch.path())?.count(), 0, "scratch directory left behind");
  Ok(())
}

#[test]
fn test_run_publishes_commits_and_pushes() -> Result<()> {
  let h = Harness::new()?;
  h.upstream.release("v1.0.0", "1.0.0", VALID_DECLARATIONS)?;
  h.upstream.release("v2.0.0", "2.0.0", VALID_DECLARATIONS)?;
  h.upstream.release("v2.1-rc", "2.1.0-rc", VALID_DECLARATIONS)?;
  h.ws.write_ledger("*", &[], 3, &h.upstream.url())?;
  h.ws.commit("Add ledger")?;

  let publisher = RecordingPublisher::default();
  let summary = h.run(&publisher, false)?;

  // 2.1.0-rc ships first, so no stable release here takes `latest`
  assert_eq!(summary.published(), 3);
  assert!(summary.failed().is_empty());
  assert!(matches!(summary.save, Some(SaveOutcome::Committed { .. })));

  let requests = publisher.requests.borrow();
  let order: Vec<_> = requests.iter().map(|r| (r.tag.as_str(), r.dist_tag.clone())).collect();
  assert_eq!(
    order,
    vec![
      ("v2.1-rc", DistTag::Named("rc".to_string())),
      ("v2.0.0", DistTag::Untagged),
      ("v1.0.0", DistTag::Untagged),
    ]
  );
  assert!(requests[0].declarations.starts_with("declare module \"typescript\" {"));
  assert!(!requests[0].declarations.contains("PerfLogger"));
  assert!(requests[0].declarations.contains("enum SyntaxKind"));
  assert!(!requests[0].declarations.contains("const enum"));

  assert_eq!(h.ws.git_log(1)?, vec![COMMIT_MESSAGE]);
  assert_eq!(h.ws.remote_head()?, h.ws.head()?);

  let ledger = h.ws.read_ledger()?;
  let records = ledger["records"].as_array().unwrap();
  assert_eq!(records.len(), 3);
  assert!(records.iter().all(|r| r["complete"] == true && r["attempts"] == 1));
  assert_eq!(records[0]["resolvedVersion"], "2.1.0-rc");

  // Everything is complete now: nothing to do, nothing committed
  let head = h.ws.head()?;
  let summary = h.run(&publisher, false)?;
  assert!(summary.outcomes.is_empty());
  assert_eq!(summary.save, None);
  assert_eq!(h.ws.head()?, head);
  Ok(())
}

#[test]
fn test_failed_tag_is_retried_until_exhausted() -> Result<()> {
  let h = Harness::new()?;
  h.upstream.release("v1.0.0", "1.0.0", VALID_DECLARATIONS)?;
  h.upstream.release("v1.1.0", "1.1.0", BROKEN_DECLARATIONS)?;
  h.ws.write_ledger(">=1.0.0", &[], 2, &h.upstream.url())?;
  h.ws.commit("Add ledger")?;
  let publisher = RecordingPublisher::default();

  let summary = h.run(&publisher, false)?;
  assert_eq!(summary.failed(), vec!["v1.1.0"]);
  let err = summary.ensure_success().unwrap_err();
  assert!(err.to_string().starts_with("Finished with errors"));
  assert_eq!(h.ws.git_log(1)?, vec![COMMIT_MESSAGE]);

  let ledger = h.ws.read_ledger()?;
  let broken = &ledger["records"][0];
  assert_eq!(broken["tag"], "v1.1.0");
  assert_eq!(broken["attempts"], 1);
  assert_eq!(broken["complete"], false);
  assert_eq!(broken["resolvedVersion"], "1.1.0");

  let summary = h.run(&publisher, false)?;
  assert_eq!(summary.failed(), vec!["v1.1.0"]);
  assert_eq!(h.ws.read_ledger()?["records"][0]["attempts"], 2);

  // At the ceiling: skipped, nothing attempted, nothing saved
  let head = h.ws.head()?;
  let summary = h.run(&publisher, false)?;
  assert_eq!(
    summary.outcomes,
    vec![("v1.1.0".to_string(), TagOutcome::Exhausted { attempts: 2 })]
  );
  assert_eq!(summary.save, None);
  assert_eq!(h.ws.head()?, head);
  assert_eq!(publisher.requests.borrow().len(), 1);
  Ok(())
}

#[test]
fn test_dry_run_writes_ledger_without_committing() -> Result<()> {
  let h = Harness::new()?;
  h.upstream.release("v3.0.0", "3.0.0", VALID_DECLARATIONS)?;
  h.ws.write_ledger("*", &[], 3, &h.upstream.url())?;
  let head = h.ws.commit("Add ledger")?;
  let remote_head = h.ws.remote_head()?;

  let publisher = RecordingPublisher::default();
  let summary = h.run(&publisher, true)?;

  assert_eq!(summary.save, Some(SaveOutcome::Written));
  assert!(publisher.requests.borrow()[0].dry_run);
  assert_eq!(h.ws.head()?, head);
  assert_eq!(h.ws.remote_head()?, remote_head);
  assert_eq!(h.ws.read_ledger()?["records"][0]["complete"], true);
  Ok(())
}

#[test]
fn test_unreachable_upstream_is_fatal() -> Result<()> {
  let h = Harness::new()?;
  h.ws.write_ledger("*", &[], 3, "file:///nonexistent/upstream.git")?;
  let head = h.ws.commit("Add ledger")?;

  let publisher = RecordingPublisher::default();
  assert!(h.run(&publisher, false).is_err());
  assert_eq!(h.ws.head()?, head);
  Ok(())
}
