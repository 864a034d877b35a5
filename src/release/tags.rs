//! Version resolution: which upstream tags still need a release
//!
//! Tags are only ever compared through their normalized semver form; the
//! stored and published tag text is never altered.

use crate::core::error::{TseiError, TseiResult};
use crate::core::scratch::scratch_dir;
use crate::core::vcs::SystemGit;
use crate::release::ledger::{Ledger, Settings};
use crate::release::pipeline::TagSource;
use regex::Regex;
use semver::{Comparator, Op, Version, VersionReq};
use std::cmp::Ordering;
use std::path::PathBuf;
use tracing::{debug, info};

/// Tags without this prefix are never release tags
pub const VERSION_PREFIX: char = 'v';

/// A tag paired with the version it is ordered by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTag {
  pub tag: String,
  pub version: Version,
}

/// Resolves remote tags into an ordered work list
pub struct VersionResolver {
  req: VersionReq,
  irregular: Regex,
}

impl VersionResolver {
  /// Build a resolver for the accepted range in `settings`
  pub fn new(settings: &Settings) -> TseiResult<Self> {
    Ok(Self {
      req: settings.version_req()?,
      irregular: Regex::new(r"^v(\d+\.\d+)-([a-zA-Z_0-9]+)$")?,
    })
  }

  /// Normalize `v<major>.<minor>-<label>` to `v<major>.<minor>.0-<label>`
  pub fn normalize(&self, tag: &str) -> String {
    self.irregular.replace(tag, "v$1.0-$2").into_owned()
  }

  /// Parse a tag into its comparable version, if it is a release tag at all
  pub fn parse(&self, tag: &str) -> Option<ResolvedTag> {
    let normalized = self.normalize(tag);
    let version = normalized.strip_prefix(VERSION_PREFIX)?;
    let version = Version::parse(version).ok()?;
    Some(ResolvedTag {
      tag: tag.to_string(),
      version,
    })
  }

  /// Whether `version` satisfies the accepted range, pre-releases included
  pub fn accepts(&self, version: &Version) -> bool {
    self.req.comparators.iter().all(|c| comparator_matches(c, version))
  }

  /// Ordered work list: accepted, not skipped, not complete, newest first
  pub fn resolve(&self, all_tags: &[String], settings: &Settings, ledger: &Ledger) -> Vec<ResolvedTag> {
    let mut seen = std::collections::HashSet::new();
    let mut resolved: Vec<ResolvedTag> = all_tags
      .iter()
      .filter(|tag| seen.insert(tag.as_str()))
      .filter_map(|tag| self.parse(tag))
      .filter(|r| self.accepts(&r.version))
      .filter(|r| !settings.skip_tags.contains(&r.tag))
      .filter(|r| !ledger.find(&r.tag).is_some_and(|record| record.complete))
      .collect();

    resolved.sort_by(|a, b| b.version.cmp_precedence(&a.version).then_with(|| b.tag.cmp(&a.tag)));
    debug!(total = all_tags.len(), resolved = resolved.len(), "resolved tags");
    resolved
  }
}

/// Resolve `all_tags` against the ledger's settings and records
pub fn resolve(all_tags: &[String], settings: &Settings, ledger: &Ledger) -> TseiResult<Vec<String>> {
  let resolver = VersionResolver::new(settings)?;
  Ok(
    resolver
      .resolve(all_tags, settings, ledger)
      .into_iter()
      .map(|r| r.tag)
      .collect(),
  )
}

/// Match one comparator with pre-release versions ordered like any other
///
/// `semver::VersionReq::matches` only admits a pre-release when a comparator
/// names the same `major.minor.patch`; here `>=1.0.0` admits `2.3.0-beta`.
/// Partial bounds behave as if suffixed with `-0`, so `<2` excludes
/// `2.0.0-rc` while `>=1.2` admits `1.2.0-rc`.
fn comparator_matches(c: &Comparator, v: &Version) -> bool {
  let triple = (v.major, v.minor, v.patch);
  let lower = (c.major, c.minor.unwrap_or(0), c.patch.unwrap_or(0));
  let exact = match (c.minor, c.patch) {
    (Some(minor), Some(patch)) => Some(Version {
      major: c.major,
      minor,
      patch,
      pre: c.pre.clone(),
      build: semver::BuildMetadata::EMPTY,
    }),
    _ => None,
  };
  // First version past everything the written components cover
  let partial_upper = match (c.minor, c.patch) {
    (None, _) => (c.major + 1, 0, 0),
    (Some(minor), None) => (c.major, minor + 1, 0),
    (Some(minor), Some(patch)) => (c.major, minor, patch + 1),
  };
  let at_least = |exact: &Option<Version>| match exact {
    Some(exact) => v.cmp_precedence(exact) != Ordering::Less,
    None => triple >= lower,
  };

  match c.op {
    Op::Exact | Op::Wildcard => match &exact {
      Some(exact) => v.cmp_precedence(exact) == Ordering::Equal,
      None => triple >= lower && triple < partial_upper,
    },
    Op::Greater => match &exact {
      Some(exact) => v.cmp_precedence(exact) == Ordering::Greater,
      None => triple >= partial_upper,
    },
    Op::GreaterEq => at_least(&exact),
    Op::Less => match &exact {
      Some(exact) => v.cmp_precedence(exact) == Ordering::Less,
      None => triple < lower,
    },
    Op::LessEq => match &exact {
      Some(exact) => v.cmp_precedence(exact) != Ordering::Greater,
      None => triple < partial_upper,
    },
    Op::Tilde => {
      let upper = match c.minor {
        Some(minor) => (c.major, minor + 1, 0),
        None => (c.major + 1, 0, 0),
      };
      at_least(&exact) && triple < upper
    }
    Op::Caret => {
      let upper = match (c.major, c.minor, c.patch) {
        (0, None, _) => (1, 0, 0),
        (0, Some(0), None) => (0, 1, 0),
        (0, Some(0), Some(patch)) => (0, 0, patch + 1),
        (0, Some(minor), _) => (0, minor + 1, 0),
        (major, _, _) => (major + 1, 0, 0),
      };
      at_least(&exact) && triple < upper
    }
    _ => false,
  }
}

/// Lists tags of a remote with system git, inside a throwaway repository
pub struct GitTagLister {
  scratch_root: PathBuf,
}

impl GitTagLister {
  pub fn new(scratch_root: PathBuf) -> Self {
    Self { scratch_root }
  }
}

impl TagSource for GitTagLister {
  fn list_tags(&self, remote: &str) -> TseiResult<Vec<String>> {
    info!("Fetching tags from {}", remote);
    let dir = scratch_dir(&self.scratch_root, "tags")?;

    let git = SystemGit::init(dir.path())?;
    git.add_remote("origin", remote)?;
    let tags = git
      .ls_remote_tags("origin")
      .map_err(|e| TseiError::message(format!("Failed to list tags of {}", remote)).context(e.to_string()))?;

    info!("Found {} tags", tags.len());
    Ok(tags)
  }
}
