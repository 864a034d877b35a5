//! Release pipeline: resolve, then build, transform and publish each tag
//!
//! Tags are processed strictly one after another. A failing tag is logged and
//! left with its attempt counted; the loop moves on. The ledger is saved once
//! at the end, and only then is a run with failures reported as failed.

use crate::core::error::{PipelineError, TseiError, TseiResult};
use crate::core::scratch::scratch_dir;
use crate::decl::DeclarationTransformer;
use crate::release::builder::BuildOutput;
use crate::release::dist_tag::{self, DistTag};
use crate::release::ledger::Ledger;
use crate::release::publisher::PublishRequest;
use crate::release::store::SaveOutcome;
use crate::release::tags;
use semver::Version;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn};

/// Lists every tag of a remote
pub trait TagSource {
  fn list_tags(&self, remote: &str) -> TseiResult<Vec<String>>;
}

/// Checks out `tag` into `scratch` and builds its declaration bundle
pub trait DeclarationBuilder {
  fn build(&self, remote: &str, tag: &str, scratch: &Path) -> TseiResult<BuildOutput>;
}

/// Submits a package to the registry
pub trait Publisher {
  fn publish(&self, request: &PublishRequest) -> TseiResult<()>;
}

/// Persists the ledger, committing it when asked
pub trait LedgerStore {
  fn save(&self, ledger: &Ledger, commit: bool) -> TseiResult<SaveOutcome>;
}

/// Pushes the committed ledger upstream
pub trait RemotePush {
  fn push(&self) -> TseiResult<()>;
}

/// Where a tag is in its build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
  Pending,
  Building,
  Transformed,
  Published,
  Failed,
}

impl fmt::Display for TagState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TagState::Pending => "pending",
      TagState::Building => "building",
      TagState::Transformed => "transformed",
      TagState::Published => "published",
      TagState::Failed => "failed",
    };
    write!(f, "{}", name)
  }
}

/// How one resolved tag ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
  Published { version: String, dist_tag: DistTag },
  /// Failed after reaching `stage`
  Failed { stage: TagState, message: String },
  /// At the attempt ceiling, not attempted
  Exhausted { attempts: u32 },
}

/// Result of a run that got past the fatal stages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  /// Resolved tags in processing order
  pub outcomes: Vec<(String, TagOutcome)>,
  /// `None` when nothing was attempted
  pub save: Option<SaveOutcome>,
}

impl RunSummary {
  /// Tags that failed this run
  pub fn failed(&self) -> Vec<String> {
    self
      .outcomes
      .iter()
      .filter(|(_, outcome)| matches!(outcome, TagOutcome::Failed { .. }))
      .map(|(tag, _)| tag.clone())
      .collect()
  }

  pub fn published(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|(_, outcome)| matches!(outcome, TagOutcome::Published { .. }))
      .count()
  }

  /// `FinishedWithErrors` if any tag failed
  pub fn ensure_success(&self) -> TseiResult<()> {
    let failed = self.failed();
    if failed.is_empty() {
      Ok(())
    } else {
      Err(TseiError::Pipeline(PipelineError::FinishedWithErrors { failed }))
    }
  }
}

/// Collaborators and options for one run
pub struct ReleasePipeline<'a> {
  pub tags: &'a dyn TagSource,
  pub builder: &'a dyn DeclarationBuilder,
  pub publisher: &'a dyn Publisher,
  pub store: &'a dyn LedgerStore,
  pub remote: &'a dyn RemotePush,
  pub transformer: DeclarationTransformer,
  pub scratch_root: PathBuf,
  /// Skip commit, push and registry submission
  pub dry_run: bool,
}

impl ReleasePipeline<'_> {
  /// Run and fail with `FinishedWithErrors` if any tag failed
  pub fn run(&self, ledger: &mut Ledger) -> TseiResult<RunSummary> {
    let summary = self.execute(ledger)?;
    summary.ensure_success()?;
    Ok(summary)
  }

  /// Run to completion, returning per-tag outcomes
  ///
  /// Only fatal errors (tag listing, range, persistence, push) are returned
  /// as `Err`; per-tag failures are in the summary.
  pub fn execute(&self, ledger: &mut Ledger) -> TseiResult<RunSummary> {
    let all_tags = self.tags.list_tags(&ledger.settings.upstream_remote_url)?;
    let resolved = tags::resolve(&all_tags, &ledger.settings, ledger)?;

    let mut summary = RunSummary::default();
    if resolved.is_empty() {
      info!("No new versions to build!");
      return Ok(summary);
    }

    info!("Resolved {} tags: {}", resolved.len(), resolved.join(", "));

    let mut attempted = false;
    for tag in resolved {
      let span = info_span!("tag", tag = %tag);
      let _guard = span.enter();

      if ledger.is_exhausted(&tag) {
        let attempts = ledger.find(&tag).map(|r| r.attempts).unwrap_or_default();
        warn!("[{}] Skipping, {} attempts reached", tag, attempts);
        summary.outcomes.push((tag, TagOutcome::Exhausted { attempts }));
        continue;
      }

      attempted = true;
      let attempts = ledger.record_attempt(&tag).attempts;
      info!("[{}] Attempt {} of {}", tag, attempts, ledger.settings.max_attempts);

      let outcome = match self.process(&tag, ledger) {
        Ok(outcome) => outcome,
        Err((stage, err)) => {
          next(&tag, stage, TagState::Failed);
          error!("[{}] Failed while {}: {}", tag, stage, err);
          TagOutcome::Failed {
            stage,
            message: err.to_string(),
          }
        }
      };
      summary.outcomes.push((tag, outcome));
    }

    if attempted {
      summary.save = Some(self.store.save(ledger, !self.dry_run)?);
      if !self.dry_run {
        self.remote.push()?;
      }
    }

    Ok(summary)
  }

  /// Build, transform and publish one tag; the error carries the stage it stopped at
  fn process(&self, tag: &str, ledger: &mut Ledger) -> Result<TagOutcome, (TagState, TseiError)> {
    let at = |state: TagState| move |err: TseiError| (state, err);

    let state = next(tag, TagState::Pending, TagState::Building);
    let scratch = scratch_dir(&self.scratch_root, "build").map_err(at(state))?;
    let remote = ledger.settings.upstream_remote_url.clone();
    let output = self.builder.build(&remote, tag, scratch.path()).map_err(at(state))?;
    drop(scratch);
    ledger.set_resolved_version(tag, &output.version);

    let declarations = self.transformer.transform(tag, &output.declarations).map_err(at(state))?;
    let state = next(tag, state, TagState::Transformed);

    let version = Version::parse(&output.version)
      .map_err(|e| TseiError::message(format!("Build reported an invalid version '{}': {}", output.version, e)))
      .map_err(at(state))?;
    let dist_tag = dist_tag::select(&version, &ledger.completed_versions());

    self
      .publisher
      .publish(&PublishRequest {
        tag: tag.to_string(),
        declarations,
        version: output.version.clone(),
        dist_tag: dist_tag.clone(),
        dry_run: self.dry_run,
      })
      .map_err(at(state))?;

    ledger.mark_complete(tag, &output.version);
    next(tag, state, TagState::Published);
    info!("[{}] Published {} ({})", tag, output.version, dist_tag);

    Ok(TagOutcome::Published {
      version: output.version,
      dist_tag,
    })
  }
}

fn next(tag: &str, from: TagState, to: TagState) -> TagState {
  tracing::debug!(tag, %from, %to, "state");
  to
}
