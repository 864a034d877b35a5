//! Distribution tag selection
//!
//! Pre-releases publish under their label (`beta`, `rc`, `dev`); stable
//! releases take `latest` unless something newer already shipped.

use semver::Version;
use std::fmt;

/// Label used for pre-releases whose identifiers are purely numeric
pub const NUMERIC_PRERELEASE_TAG: &str = "next";

/// Channel a release is published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistTag {
  Named(String),
  /// A stable release older than one already published
  Untagged,
}

impl DistTag {
  pub fn latest() -> Self {
    DistTag::Named("latest".to_string())
  }
}

impl fmt::Display for DistTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DistTag::Named(name) => write!(f, "{}", name),
      DistTag::Untagged => write!(f, "(untagged)"),
    }
  }
}

/// Pick the channel for `version`, given versions already published
///
/// A stable release stays off `latest` when any completed version, pre-release
/// or not, has higher precedence.
pub fn select(version: &Version, completed: &[Version]) -> DistTag {
  if !version.pre.is_empty() {
    return DistTag::Named(prerelease_label(version));
  }

  if completed.iter().any(|v| v.cmp_precedence(version).is_gt()) {
    DistTag::Untagged
  } else {
    DistTag::latest()
  }
}

/// `3.0.0-beta.1` -> `beta`, `4.0.0-dev.20200101` -> `dev`
fn prerelease_label(version: &Version) -> String {
  let label = version
    .pre
    .as_str()
    .trim_end_matches(|c: char| c.is_ascii_digit())
    .trim_end_matches(['.', '-']);

  if label.is_empty() {
    NUMERIC_PRERELEASE_TAG.to_string()
  } else {
    label.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
  }

  #[test]
  fn test_stable_is_latest() {
    assert_eq!(select(&v("2.0.0"), &[]), DistTag::latest());
    assert_eq!(select(&v("2.0.0"), &[v("1.9.0"), v("2.0.0")]), DistTag::latest());
  }

  #[test]
  fn test_stable_backfill_is_untagged() {
    assert_eq!(select(&v("1.5.0"), &[v("2.0.0")]), DistTag::Untagged);
    assert_eq!(select(&v("1.5.0"), &[v("1.4.0")]), DistTag::latest());
  }

  #[test]
  fn test_prerelease_completed_higher_does_not_matter() {
    assert_eq!(select(&v("3.0.0-beta.1"), &[v("9.0.0")]), DistTag::Named("beta".to_string()));
  }

  #[test]
  fn test_prerelease_labels() {
    assert_eq!(select(&v("3.0.0-beta.1"), &[]), DistTag::Named("beta".to_string()));
    assert_eq!(select(&v("3.0.0-rc"), &[]), DistTag::Named("rc".to_string()));
    assert_eq!(select(&v("4.0.0-dev.20200101"), &[]), DistTag::Named("dev".to_string()));
    assert_eq!(select(&v("2.3.0-insiders.20180410"), &[]), DistTag::Named("insiders".to_string()));
    assert_eq!(select(&v("1.0.0-0"), &[]), DistTag::Named("next".to_string()));
  }

  #[test]
  fn test_higher_prerelease_demotes_stable() {
    assert_eq!(select(&v("2.0.0"), &[v("2.0.0-rc")]), DistTag::latest());
    assert_eq!(select(&v("2.0.0"), &[v("3.0.0-rc")]), DistTag::Untagged);
  }
}
