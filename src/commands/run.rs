//! `tsei run` - process every pending upstream tag

use crate::core::context::RunContext;
use crate::core::error::TseiResult;
use crate::core::vcs::SystemGit;
use crate::decl::DeclarationTransformer;
use crate::release::pipeline::{ReleasePipeline, RunSummary, TagOutcome};
use crate::release::store::{self, FileLedgerStore, GitRemote, SaveOutcome};
use crate::release::{CommandBuilder, GitTagLister, NpmPublisher};
use tracing::debug;

/// Run the release pipeline
///
/// Dry runs still build, transform and validate every tag and write the
/// ledger file, but never commit, push, or submit to the registry.
pub fn run_pipeline(ctx: &RunContext, dry_run: bool) -> TseiResult<()> {
  let ledger_path = ctx.ledger_path();
  let mut ledger = store::load(&ledger_path)?;

  if dry_run {
    println!("🔍 DRY RUN: nothing will be committed, pushed or published");
  }

  let git = if dry_run {
    SystemGit::open(&ctx.root).ok()
  } else {
    Some(SystemGit::open(&ctx.root)?)
  };
  debug!(root = %ctx.root.display(), has_git = git.is_some(), "opened root");

  let scratch_root = ctx.scratch_root();
  let config = &ctx.config;

  let tags = GitTagLister::new(scratch_root.clone());
  let builder = CommandBuilder::new(config.build.clone(), config.exposure.clone());
  let publisher = NpmPublisher::new(
    config.package_files_path(&ctx.root),
    scratch_root.clone(),
    config.publish.clone(),
  );
  let remote = GitRemote::new(git.clone().unwrap_or_else(|| SystemGit::at(&ctx.root)));
  let store = FileLedgerStore::new(ledger_path, git);

  let pipeline = ReleasePipeline {
    tags: &tags,
    builder: &builder,
    publisher: &publisher,
    store: &store,
    remote: &remote,
    transformer: DeclarationTransformer::new(config.transform.clone()),
    scratch_root,
    dry_run,
  };

  let summary = pipeline.execute(&mut ledger)?;
  print_summary(&summary);
  summary.ensure_success()
}

fn print_summary(summary: &RunSummary) {
  if summary.outcomes.is_empty() {
    println!("✅ No new versions to build!");
    return;
  }

  println!("\n📦 Release Summary\n");
  println!("{:<24} {:<14} DETAIL", "TAG", "RESULT");
  println!("{:-<80}", "");

  for (tag, outcome) in &summary.outcomes {
    let (result, detail) = match outcome {
      TagOutcome::Published { version, dist_tag } => ("published", format!("{} ({})", version, dist_tag)),
      TagOutcome::Failed { stage, message } => (
        "failed",
        format!("while {}: {}", stage, message.lines().next().unwrap_or_default()),
      ),
      TagOutcome::Exhausted { attempts } => ("skipped", format!("{} attempts reached", attempts)),
    };
    println!("{:<24} {:<14} {}", tag, result, detail);
  }

  match &summary.save {
    Some(SaveOutcome::Committed { head }) => println!("\n💾 Ledger committed ({})", head),
    Some(SaveOutcome::Unchanged) => println!("\n💾 Ledger unchanged"),
    Some(SaveOutcome::Written) => println!("\n💾 Ledger written (not committed)"),
    None => {}
  }

  let failed = summary.failed().len();
  if failed == 0 {
    println!("✅ {} published", summary.published());
  } else {
    println!("⚠️  {} published, {} failed", summary.published(), failed);
  }
}
