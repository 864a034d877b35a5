//! Run context - build once in main, pass everywhere
//!
//! ```text
//! main.rs:
//!   RunContext::build() -> &RunContext
//!   |
//!   v
//! commands/run.rs, tags.rs, status.rs, transform.rs:
//!   fn execute(ctx: &RunContext, ...)
//! ```

use crate::core::config::TseiConfig;
use crate::core::error::{ResultExt, TseiResult};
use std::path::{Path, PathBuf};

/// Root directory plus the configuration loaded for it
#[derive(Debug, Clone)]
pub struct RunContext {
  /// Pipeline root (absolute path); holds the ledger and package files
  pub root: PathBuf,

  /// tsei.toml, or defaults when there is none
  pub config: TseiConfig,
}

impl RunContext {
  /// Build the context for `root`, loading `config_path` or the discovered tsei.toml
  pub fn build(root: &Path, config_path: Option<&Path>) -> TseiResult<Self> {
    let root = root
      .canonicalize()
      .with_context(|| format!("Root directory not found: {}", root.display()))?;
    let config = TseiConfig::load(&root, config_path)?;

    Ok(Self { root, config })
  }

  /// Ledger file location
  pub fn ledger_path(&self) -> PathBuf {
    self.config.ledger_path(&self.root)
  }

  /// Parent directory for scratch directories
  pub fn scratch_root(&self) -> PathBuf {
    self.config.scratch_root(&self.root)
  }
}
