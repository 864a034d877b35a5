use serde::Serialize;

use crate::core::context::RunContext;
use crate::core::error::TseiResult;
use crate::release::ledger::{BuildAttempt, Ledger};
use crate::release::store;

/// Where a ledger record stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
  /// Published
  Complete,
  /// Will be retried on the next run
  Pending,
  /// At the attempt ceiling; skipped until the ledger is edited
  Exhausted,
}

/// Status of a single ledger record
#[derive(Debug, Clone, Serialize)]
pub struct RecordStatus {
  pub tag: String,
  pub state: RecordState,
  pub attempts: u32,
  pub resolved_version: Option<String>,
  pub last_attempt_time: String,
}

/// Whole-ledger summary
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStatus {
  pub accepted_version_range: String,
  pub max_attempts: u32,
  pub complete: usize,
  pub pending: usize,
  pub exhausted: usize,
  pub records: Vec<RecordStatus>,
}

impl LedgerStatus {
  pub fn from_ledger(ledger: &Ledger) -> Self {
    let records: Vec<RecordStatus> = ledger.records.iter().map(|r| record_status(ledger, r)).collect();
    let count = |state: RecordState| records.iter().filter(|r| r.state == state).count();

    Self {
      accepted_version_range: ledger.settings.accepted_version_range.clone(),
      max_attempts: ledger.settings.max_attempts,
      complete: count(RecordState::Complete),
      pending: count(RecordState::Pending),
      exhausted: count(RecordState::Exhausted),
      records,
    }
  }
}

fn record_status(ledger: &Ledger, record: &BuildAttempt) -> RecordStatus {
  let state = if record.complete {
    RecordState::Complete
  } else if ledger.is_exhausted(&record.tag) {
    RecordState::Exhausted
  } else {
    RecordState::Pending
  };

  RecordStatus {
    tag: record.tag.clone(),
    state,
    attempts: record.attempts,
    resolved_version: record.resolved_version.clone(),
    last_attempt_time: record.last_attempt_time.to_rfc3339(),
  }
}

/// Run the status command
pub fn run_status(ctx: &RunContext, json: bool) -> TseiResult<()> {
  let ledger = store::load(&ctx.ledger_path())?;
  let status = LedgerStatus::from_ledger(&ledger);

  if json {
    println!("{}", serde_json::to_string_pretty(&status)?);
  } else {
    print_status_table(&status);
  }

  Ok(())
}

/// Print status as a formatted table
fn print_status_table(status: &LedgerStatus) {
  println!("\n📊 Ledger Status\n");
  println!(
    "range: {}   max attempts: {}   complete: {}   pending: {}   exhausted: {}\n",
    status.accepted_version_range, status.max_attempts, status.complete, status.pending, status.exhausted
  );

  if status.records.is_empty() {
    println!("No releases attempted yet");
    return;
  }

  println!("{:<24} {:<10} {:<9} {:<20} LAST ATTEMPT", "TAG", "STATE", "ATTEMPTS", "VERSION");
  println!("{:-<100}", "");

  for record in &status.records {
    let state = match record.state {
      RecordState::Complete => "complete",
      RecordState::Pending => "pending",
      RecordState::Exhausted => "exhausted",
    };
    println!(
      "{:<24} {:<10} {:<9} {:<20} {}",
      record.tag,
      state,
      record.attempts,
      record.resolved_version.as_deref().unwrap_or("-"),
      record.last_attempt_time
    );
  }
}
