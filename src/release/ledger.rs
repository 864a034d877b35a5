//! The release ledger: settings plus one build record per attempted tag
//!
//! Pure data. Loading and saving live in [`crate::release::store`]; the
//! pipeline owns the ledger mutably for the duration of a run.

use crate::core::error::{ConfigError, TseiError, TseiResult};
use chrono::{DateTime, Utc};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

/// Per-run settings, stored alongside the records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
  /// Semver range a tag's version must satisfy
  pub accepted_version_range: String,

  /// Tags never processed, matched exactly
  #[serde(default)]
  pub skip_tags: Vec<String>,

  /// Attempt ceiling per tag
  pub max_attempts: u32,

  /// Remote the tags are listed from and built out of
  pub upstream_remote_url: String,
}

impl Settings {
  /// Parsed accepted range
  pub fn version_req(&self) -> TseiResult<VersionReq> {
    VersionReq::parse(self.accepted_version_range.trim()).map_err(|e| {
      TseiError::Config(ConfigError::InvalidSetting {
        field: "acceptedVersionRange".to_string(),
        reason: format!("'{}' is not a version range: {}", self.accepted_version_range, e),
      })
    })
  }

  /// Reject settings no run could make progress with
  pub fn validate(&self) -> TseiResult<()> {
    self.version_req()?;
    if self.max_attempts == 0 {
      return Err(TseiError::Config(ConfigError::InvalidSetting {
        field: "maxAttempts".to_string(),
        reason: "must be at least 1".to_string(),
      }));
    }
    if self.upstream_remote_url.trim().is_empty() {
      return Err(TseiError::Config(ConfigError::InvalidSetting {
        field: "upstreamRemoteUrl".to_string(),
        reason: "must not be empty".to_string(),
      }));
    }
    Ok(())
  }
}

/// Build history of one tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildAttempt {
  pub tag: String,

  /// Version reported by the build step, once it got that far
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub resolved_version: Option<String>,

  pub attempts: u32,

  pub complete: bool,

  pub last_attempt_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
  pub settings: Settings,

  #[serde(default)]
  pub records: Vec<BuildAttempt>,
}

impl Ledger {
  /// Empty ledger with `settings`
  pub fn new(settings: Settings) -> Self {
    Self {
      settings,
      records: Vec::new(),
    }
  }

  pub fn find(&self, tag: &str) -> Option<&BuildAttempt> {
    self.records.iter().find(|r| r.tag == tag)
  }

  fn find_mut(&mut self, tag: &str) -> Option<&mut BuildAttempt> {
    self.records.iter_mut().find(|r| r.tag == tag)
  }

  /// Count a new attempt for `tag`, creating its record on first use
  ///
  /// # Panics
  ///
  /// If `tag` is already complete. The resolver never yields complete tags.
  pub fn record_attempt(&mut self, tag: &str) -> &BuildAttempt {
    self.record_attempt_at(tag, Utc::now())
  }

  pub fn record_attempt_at(&mut self, tag: &str, now: DateTime<Utc>) -> &BuildAttempt {
    let idx = match self.records.iter().position(|r| r.tag == tag) {
      Some(idx) => {
        let record = &mut self.records[idx];
        if record.complete {
          unreachable!("attempted already complete tag {}", tag);
        }
        record.attempts += 1;
        record.last_attempt_time = now;
        idx
      }
      None => {
        self.records.push(BuildAttempt {
          tag: tag.to_string(),
          resolved_version: None,
          attempts: 1,
          complete: false,
          last_attempt_time: now,
        });
        self.records.len() - 1
      }
    };
    &self.records[idx]
  }

  /// Remember the version the build step reported for `tag`
  pub fn set_resolved_version(&mut self, tag: &str, version: &str) {
    match self.find_mut(tag) {
      Some(record) => record.resolved_version = Some(version.to_string()),
      None => unreachable!("no attempt recorded for {}", tag),
    }
  }

  /// Mark `tag` published
  pub fn mark_complete(&mut self, tag: &str, resolved_version: &str) {
    match self.find_mut(tag) {
      Some(record) => {
        record.resolved_version = Some(resolved_version.to_string());
        record.complete = true;
      }
      None => unreachable!("no attempt recorded for {}", tag),
    }
  }

  /// Incomplete and at the attempt ceiling
  pub fn is_exhausted(&self, tag: &str) -> bool {
    self
      .find(tag)
      .is_some_and(|r| !r.complete && r.attempts >= self.settings.max_attempts)
  }

  /// Versions of every completed record whose version parses
  pub fn completed_versions(&self) -> Vec<Version> {
    self
      .records
      .iter()
      .filter(|r| r.complete)
      .filter_map(|r| r.resolved_version.as_deref())
      .filter_map(|v| Version::parse(v).ok())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn settings() -> Settings {
    Settings {
      accepted_version_range: ">=1.0.0".to_string(),
      skip_tags: vec![],
      max_attempts: 2,
      upstream_remote_url: "https://example.invalid/compiler.git".to_string(),
    }
  }

  #[test]
  fn test_record_attempt_creates_then_increments() {
    let mut ledger = Ledger::new(settings());
    let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

    let record = ledger.record_attempt_at("v1.0.0", first).clone();
    assert_eq!(record.attempts, 1);
    assert!(!record.complete);
    assert_eq!(record.resolved_version, None);

    let record = ledger.record_attempt_at("v1.0.0", second);
    assert_eq!(record.attempts, 2);
    assert_eq!(record.last_attempt_time, second);
    assert_eq!(ledger.records.len(), 1);
  }

  #[test]
  #[should_panic(expected = "already complete")]
  fn test_record_attempt_on_complete_panics() {
    let mut ledger = Ledger::new(settings());
    ledger.record_attempt("v1.0.0");
    ledger.mark_complete("v1.0.0", "1.0.0");
    ledger.record_attempt("v1.0.0");
  }

  #[test]
  fn test_exhaustion() {
    let mut ledger = Ledger::new(settings());
    assert!(!ledger.is_exhausted("v1.0.0"));
    ledger.record_attempt("v1.0.0");
    assert!(!ledger.is_exhausted("v1.0.0"));
    ledger.record_attempt("v1.0.0");
    assert!(ledger.is_exhausted("v1.0.0"));

    ledger.record_attempt("v2.0.0");
    ledger.record_attempt("v2.0.0");
    ledger.mark_complete("v2.0.0", "2.0.0");
    assert!(!ledger.is_exhausted("v2.0.0"));
  }

  #[test]
  fn test_completed_versions() {
    let mut ledger = Ledger::new(settings());
    ledger.record_attempt("v1.0.0");
    ledger.mark_complete("v1.0.0", "1.0.0");
    ledger.record_attempt("v2.0.0");
    ledger.set_resolved_version("v2.0.0", "2.0.0");

    assert_eq!(ledger.completed_versions(), vec![Version::new(1, 0, 0)]);
    assert_eq!(ledger.find("v2.0.0").unwrap().resolved_version.as_deref(), Some("2.0.0"));
  }

  #[test]
  fn test_settings_validation() {
    assert!(settings().validate().is_ok());
    assert!(
      Settings {
        max_attempts: 0,
        ..settings()
      }
      .validate()
      .is_err()
    );
    assert!(
      Settings {
        accepted_version_range: ">=x".to_string(),
        ..settings()
      }
      .validate()
      .is_err()
    );
  }

  #[test]
  fn test_serialized_field_names() {
    let mut ledger = Ledger::new(settings());
    ledger.record_attempt_at("v1.0.0", Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

    let json = serde_json::to_value(&ledger).unwrap();
    assert_eq!(json["settings"]["acceptedVersionRange"], ">=1.0.0");
    assert_eq!(json["settings"]["maxAttempts"], 2);
    assert_eq!(json["records"][0]["lastAttemptTime"], "2024-05-01T12:00:00Z");
    assert!(json["records"][0].get("resolvedVersion").is_none());
  }
}
