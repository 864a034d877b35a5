//! Declaration transformation and validation
//!
//! Turns a compiler's internal declaration bundle into a standalone public
//! module declaration: parse, rewrite, print, then parse and check the
//! printed text again as an independent unit.

pub mod ast;
mod builtins;
mod check;
mod diagnostic;
mod lexer;
pub mod parser;
pub mod printer;
pub mod rewrite;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{TseiError, TseiResult, ValidationError};

pub use diagnostic::{Diagnostic, Pos};

/// Fixed rewrite parameters, configurable through `[transform]` in tsei.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
  /// Ambient namespace the compiler emits its API into
  pub scope_name: String,
  /// Module name the namespace is re-exposed as
  pub package_name: String,
  /// Internal type aliases and constants removed at any depth
  pub strip_declarations: Vec<String>,
  /// Top-level ambient variables removed from the bundle
  pub strip_globals: Vec<String>,
}

impl Default for TransformOptions {
  fn default() -> Self {
    Self {
      scope_name: "ts".to_string(),
      package_name: "typescript".to_string(),
      strip_declarations: vec!["PerfLogger".to_string(), "perfLogger".to_string()],
      strip_globals: vec!["window".to_string(), "module".to_string()],
    }
  }
}

/// Pure text-to-text declaration transformer
#[derive(Debug, Clone, Default)]
pub struct DeclarationTransformer {
  options: TransformOptions,
}

impl DeclarationTransformer {
  pub fn new(options: TransformOptions) -> Self {
    Self { options }
  }

  /// Rewrite `raw` into publishable declaration text for `tag`
  ///
  /// Fails with [`ValidationError::Unparsable`] when the input itself does not
  /// parse, and with [`ValidationError::Diagnostics`] when the rewritten output
  /// does not check cleanly.
  pub fn transform(&self, tag: &str, raw: &str) -> TseiResult<String> {
    info!("[{}] Transforming & verifying declarations...", tag);

    let mut file = parser::parse(raw).map_err(|diagnostics| {
      TseiError::Validation(ValidationError::Unparsable {
        tag: tag.to_string(),
        diagnostics,
      })
    })?;

    rewrite::apply(&mut file, &self.options);
    let output = printer::print(&file);
    debug!(tag, bytes = output.len(), "printed transformed declarations");

    let diagnostics = validate(&output);
    if !diagnostics.is_empty() {
      return Err(TseiError::Validation(ValidationError::Diagnostics {
        tag: tag.to_string(),
        diagnostics,
      }));
    }

    Ok(output)
  }
}

/// Parse and check declaration text on its own, against the ES2018 library
pub fn validate(text: &str) -> Vec<Diagnostic> {
  match parser::parse(text) {
    Ok(file) => check::check(&file),
    Err(diagnostics) => diagnostics,
  }
}
