//! `tsei tags` - show the work a run would do, without building anything

use crate::core::context::RunContext;
use crate::core::error::TseiResult;
use crate::release::pipeline::TagSource;
use crate::release::store;
use crate::release::{GitTagLister, VersionResolver};
use serde::Serialize;

/// A tag a run would visit
#[derive(Debug, Clone, Serialize)]
pub struct PendingTag {
  pub tag: String,
  pub version: String,
  /// Attempts so far
  pub attempts: u32,
  /// At the attempt ceiling; a run would skip it
  pub exhausted: bool,
}

/// Run the tags command
pub fn run_tags(ctx: &RunContext, json: bool) -> TseiResult<()> {
  let ledger = store::load(&ctx.ledger_path())?;
  let settings = &ledger.settings;

  let lister = GitTagLister::new(ctx.scratch_root());
  let all_tags = lister.list_tags(&settings.upstream_remote_url)?;
  let resolver = VersionResolver::new(settings)?;

  let pending: Vec<PendingTag> = resolver
    .resolve(&all_tags, settings, &ledger)
    .into_iter()
    .map(|resolved| PendingTag {
      attempts: ledger.find(&resolved.tag).map(|r| r.attempts).unwrap_or(0),
      exhausted: ledger.is_exhausted(&resolved.tag),
      version: resolved.version.to_string(),
      tag: resolved.tag,
    })
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&pending)?);
    return Ok(());
  }

  if pending.is_empty() {
    println!("✅ No new versions to build!");
    return Ok(());
  }

  println!("\n🏷️  Pending Tags ({} of {} remote tags)\n", pending.len(), all_tags.len());
  println!("{:<24} {:<24} ATTEMPTS", "TAG", "VERSION");
  println!("{:-<60}", "");
  for tag in &pending {
    let attempts = if tag.exhausted {
      format!("{}/{} (exhausted)", tag.attempts, settings.max_attempts)
    } else {
      format!("{}/{}", tag.attempts, settings.max_attempts)
    };
    println!("{:<24} {:<24} {}", tag.tag, tag.version, attempts);
  }

  Ok(())
}
