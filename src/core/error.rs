//! Error types for tsei with contextual messages and exit codes
//!
//! Every failure in the pipeline is categorized so the CLI can pick an exit
//! code and, where it helps, print a suggestion. Per-tag failures travel as
//! the same type but are caught at the pipeline boundary and never abort a run.

use crate::decl::Diagnostic;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for tsei
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, ledger, invalid args, missing files)
  User = 1,
  /// System error (git, external commands, I/O)
  System = 2,
  /// Validation failure (declaration diagnostics, failed releases)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for tsei
#[derive(Debug)]
pub enum TseiError {
  /// Configuration and ledger errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Declaration validation errors
  Validation(ValidationError),

  /// Run-level pipeline outcomes
  Pipeline(PipelineError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl TseiError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    TseiError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    TseiError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      TseiError::Message { message, context, help } => TseiError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      TseiError::Io(err) => TseiError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      TseiError::Config(_) => ExitCode::User,
      TseiError::Git(_) => ExitCode::System,
      TseiError::Validation(_) => ExitCode::Validation,
      TseiError::Pipeline(_) => ExitCode::Validation,
      TseiError::Io(_) => ExitCode::System,
      TseiError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      TseiError::Config(e) => e.help_message(),
      TseiError::Git(e) => e.help_message(),
      TseiError::Pipeline(e) => e.help_message(),
      TseiError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for TseiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TseiError::Config(e) => write!(f, "{}", e),
      TseiError::Git(e) => write!(f, "{}", e),
      TseiError::Validation(e) => write!(f, "{}", e),
      TseiError::Pipeline(e) => write!(f, "{}", e),
      TseiError::Io(e) => write!(f, "I/O error: {}", e),
      TseiError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for TseiError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      TseiError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for TseiError {
  fn from(err: io::Error) -> Self {
    TseiError::Io(err)
  }
}

impl From<String> for TseiError {
  fn from(msg: String) -> Self {
    TseiError::message(msg)
  }
}

impl From<&str> for TseiError {
  fn from(msg: &str) -> Self {
    TseiError::message(msg)
  }
}

impl From<toml_edit::de::Error> for TseiError {
  fn from(err: toml_edit::de::Error) -> Self {
    TseiError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for TseiError {
  fn from(err: serde_json::Error) -> Self {
    TseiError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for TseiError {
  fn from(err: semver::Error) -> Self {
    TseiError::message(format!("Semver error: {}", err))
  }
}

impl From<regex::Error> for TseiError {
  fn from(err: regex::Error) -> Self {
    TseiError::message(format!("Regex error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for TseiError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    TseiError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Ledger file not found
  LedgerNotFound { path: PathBuf },

  /// Ledger file exists but cannot be understood
  LedgerInvalid { path: PathBuf, reason: String },

  /// Invalid value in settings or tsei.toml
  InvalidSetting { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::LedgerNotFound { .. } => Some(
        "Create the ledger with a `settings` object (acceptedVersionRange, skipTags, maxAttempts, upstreamRemoteUrl) and an empty `records` list.".to_string(),
      ),
      ConfigError::LedgerInvalid { .. } => Some("Fix the ledger file by hand; tsei never rewrites an unreadable ledger.".to_string()),
      ConfigError::InvalidSetting { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::LedgerNotFound { path } => {
        write!(f, "Ledger file not found: {}", path.display())
      }
      ConfigError::LedgerInvalid { path, reason } => {
        write!(f, "Ledger file {} is invalid: {}", path.display(), reason)
      }
      ConfigError::InvalidSetting { field, reason } => {
        write!(f, "Invalid setting '{}': {}", field, reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// A commit was requested but HEAD did not move
  CommitNotRecorded { path: PathBuf, head: String },

  /// Push failed
  PushFailed { reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason } => {
        if reason.contains("non-fast-forward") {
          Some("The remote has commits you don't have. Pull, then re-run; the ledger is already committed locally.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("Check the push credentials available to this environment.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "The ledger must live inside a git checkout to be committed: {}",
        path.display()
      )),
      GitError::CommitNotRecorded { .. } => {
        Some("Check for commit hooks or a read-only index; the ledger on disk is ahead of history.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::CommitNotRecorded { path, head } => {
        write!(
          f,
          "Failed to commit {}: HEAD is still {}",
          path.display(),
          head
        )
      }
      GitError::PushFailed { reason } => {
        write!(f, "Push failed: {}", reason)
      }
    }
  }
}

/// Declaration validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// The raw compiler output could not be parsed
  Unparsable { tag: String, diagnostics: Vec<Diagnostic> },

  /// The transformed output did not check cleanly
  Diagnostics { tag: String, diagnostics: Vec<Diagnostic> },
}

impl ValidationError {
  /// All diagnostics carried by this error
  pub fn diagnostics(&self) -> &[Diagnostic] {
    match self {
      ValidationError::Unparsable { diagnostics, .. } | ValidationError::Diagnostics { diagnostics, .. } => diagnostics,
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (tag, heading) = match self {
      ValidationError::Unparsable { tag, .. } => (tag, "Declaration input could not be parsed"),
      ValidationError::Diagnostics { tag, .. } => (tag, "Transformed file has diagnostics errors"),
    };
    writeln!(f, "[{}] {}:", tag, heading)?;
    for diagnostic in self.diagnostics() {
      write!(f, "\n{}", diagnostic)?;
    }
    Ok(())
  }
}

/// Run-level pipeline outcomes
#[derive(Debug)]
pub enum PipelineError {
  /// One or more tags failed; the ledger was saved before this was raised
  FinishedWithErrors { failed: Vec<String> },
}

impl PipelineError {
  fn help_message(&self) -> Option<String> {
    match self {
      PipelineError::FinishedWithErrors { .. } => {
        Some("Failed tags are retried on the next run until they reach maxAttempts.".to_string())
      }
    }
  }
}

impl fmt::Display for PipelineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipelineError::FinishedWithErrors { failed } => {
        write!(f, "Finished with errors ({}): {}", failed.len(), failed.join(", "))
      }
    }
  }
}

/// Result type alias for tsei
pub type TseiResult<T> = Result<T, TseiError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> TseiResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> TseiResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<TseiError>,
{
  fn context(self, ctx: impl Into<String>) -> TseiResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> TseiResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &TseiError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exit_codes_by_category() {
    let config = TseiError::Config(ConfigError::LedgerNotFound { path: "x".into() });
    assert_eq!(config.exit_code(), ExitCode::User);

    let git = TseiError::Git(GitError::PushFailed { reason: "boom".into() });
    assert_eq!(git.exit_code(), ExitCode::System);

    let run = TseiError::Pipeline(PipelineError::FinishedWithErrors { failed: vec!["v1.0.0".into()] });
    assert_eq!(run.exit_code().as_i32(), 3);
  }

  #[test]
  fn test_context_wraps_io_errors() {
    let err = TseiError::from(io::Error::new(io::ErrorKind::NotFound, "gone")).context("reading ledger");
    assert!(err.to_string().starts_with("reading ledger: "));
  }

  #[test]
  fn test_finished_with_errors_lists_tags() {
    let err = PipelineError::FinishedWithErrors {
      failed: vec!["v2.0.0".into(), "v1.1.0".into()],
    };
    assert_eq!(err.to_string(), "Finished with errors (2): v2.0.0, v1.1.0");
  }
}
