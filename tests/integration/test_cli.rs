//! End-to-end tests of the tsei binary

use crate::helpers::{
  BROKEN_DECLARATIONS, TEST_CONFIG, TestWorkspace, UpstreamRepo, VALID_DECLARATIONS, run_tsei, run_tsei_ok,
};
use anyhow::Result;

#[test]
fn test_transform_writes_output_file() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("raw.d.ts", VALID_DECLARATIONS)?;

  let output = run_tsei_ok(&ws.path, &["transform", "raw.d.ts", "-o", "out.d.ts"])?;
  assert!(output.stdout.is_empty());
  assert!(String::from_utf8_lossy(&output.stderr).contains("Wrote out.d.ts"));
  assert!(ws.read_file("out.d.ts")?.starts_with("declare module \"typescript\" {"));
  Ok(())
}

#[test]
fn test_transform_prints_to_stdout() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("raw.d.ts", VALID_DECLARATIONS)?;

  let output = run_tsei_ok(&ws.path, &["transform", "raw.d.ts"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.starts_with("declare module \"typescript\" {"));
  assert!(!stdout.contains("ts."));
  Ok(())
}

#[test]
fn test_transform_diagnostics_exit_with_validation_code() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("raw.d.ts", BROKEN_DECLARATIONS)?;

  let output = run_tsei(&ws.path, &["transform", "raw.d.ts", "--tag", "v9.9.9"])?;
  assert_eq!(output.status.code(), Some(3));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("[v9.9.9] Transformed file has diagnostics errors"), "{}", stderr);
  assert!(stderr.contains("MissingKind"));
  Ok(())
}

#[test]
fn test_status_without_ledger_is_a_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_tsei(&ws.path, &["status"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Ledger file not found"));
  Ok(())
}

#[test]
fn test_status_json_reports_records() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file(
    "tsei-ledger.json",
    r#"{
  "settings": {
    "acceptedVersionRange": "*",
    "skipTags": [],
    "maxAttempts": 2,
    "upstreamRemoteUrl": "https://example.invalid/compiler.git"
  },
  "records": [
    { "tag": "v1.0.0", "resolvedVersion": "1.0.0", "attempts": 1, "complete": true, "lastAttemptTime": "2024-01-01T00:00:00Z" },
    { "tag": "v1.1.0", "attempts": 2, "complete": false, "lastAttemptTime": "2024-01-02T00:00:00Z" }
  ]
}
"#,
  )?;

  let output = run_tsei_ok(&ws.path, &["status", "--json"])?;
  let status: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(status["complete"], 1);
  assert_eq!(status["exhausted"], 1);
  assert_eq!(status["records"][0]["state"], "complete");
  assert_eq!(status["records"][1]["state"], "exhausted");
  Ok(())
}

#[test]
fn test_tags_json_lists_pending_work() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let upstream = UpstreamRepo::new()?;
  upstream.release("v1.0.0", "1.0.0", VALID_DECLARATIONS)?;
  upstream.release("v2.0.0", "2.0.0", VALID_DECLARATIONS)?;
  upstream.release("v2.1-beta", "2.1.0-beta", VALID_DECLARATIONS)?;
  ws.write_ledger(">=2.0.0", &[], 3, &upstream.url())?;

  let output = run_tsei_ok(&ws.path, &["tags", "--json"])?;
  let tags: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let names: Vec<_> = tags.as_array().unwrap().iter().map(|t| t["tag"].as_str().unwrap()).collect();
  assert_eq!(names, vec!["v2.1-beta", "v2.0.0"]);
  assert_eq!(tags[0]["version"], "2.1.0-beta");
  assert_eq!(tags[0]["attempts"], 0);
  Ok(())
}

#[test]
fn test_run_with_nothing_pending_succeeds() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let upstream = UpstreamRepo::new()?;
  upstream.release("v1.0.0", "1.0.0", VALID_DECLARATIONS)?;
  ws.write_file("tsei.toml", TEST_CONFIG)?;
  ws.write_ledger("*", &["v1.0.0"], 3, &upstream.url())?;
  let head = ws.commit("Add ledger")?;

  let output = run_tsei_ok(&ws.path, &["run", "--dry-run"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("No new versions to build!"));
  assert_eq!(ws.head()?, head);
  Ok(())
}

#[test]
fn test_missing_config_file_is_a_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_tsei(&ws.path, &["--config", "missing.toml", "status"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
  Ok(())
}
