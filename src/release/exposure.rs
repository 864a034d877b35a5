//! Exposure policy applied to a checkout before the upstream build
//!
//! Some declarations the public API refers to are module-private upstream.
//! The policy lists them per source file; each gets `export ` prepended so
//! the declaration bundle carries them. Internal declarations are kept by
//! turning off `stripInternal` in the compiler config.

use crate::core::error::{ResultExt, TseiError, TseiResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Declarations to export in one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureRule {
  /// Path relative to the policy's source directory
  pub file: PathBuf,

  /// Line prefixes, e.g. `const enum Usage`
  pub declarations: Vec<String>,
}

/// Versioned table of declarations forced visible before building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposurePolicy {
  pub version: u32,

  /// Directory rule files are relative to, inside the checkout
  pub source_dir: PathBuf,

  pub rules: Vec<ExposureRule>,

  /// Candidate compiler configs, first existing one wins
  pub compiler_configs: Vec<PathBuf>,
}

/// What applying a policy changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExposureReport {
  /// Declarations that gained an `export`
  pub exported: usize,

  /// Rule files absent from the checkout
  pub missing: Vec<PathBuf>,

  /// Compiler config that had `stripInternal` turned off
  pub compiler_config: PathBuf,
}

fn rule(file: &str, declarations: &[&str]) -> ExposureRule {
  ExposureRule {
    file: PathBuf::from(file),
    declarations: declarations.iter().map(|d| d.to_string()).collect(),
  }
}

impl Default for ExposurePolicy {
  fn default() -> Self {
    Self {
      version: 1,
      source_dir: PathBuf::from("src"),
      rules: vec![
        rule(
          "services/refactors/extractSymbol.ts",
          &["const enum Usage", "type RangeToExtract", "interface TargetRange", "enum RangeFacts"],
        ),
        rule("services/formatting/rulesMap.ts", &["enum RulesPosition"]),
        rule("services/codefixes/annotateWithTypeFromJSDoc.ts", &["type DeclarationWithType"]),
        rule("services/codefixes/importFixes.ts", &["const enum ImportKind"]),
        rule(
          "services/symbolDisplay.ts",
          &["interface SymbolDisplayPartsDocumentationAndSymbolKind"],
        ),
        rule("compiler/watchUtilities.ts", &["interface FileAndDirectoryExistence"]),
        rule("compiler/parser.ts", &["type PragmaDiagnosticReporter"]),
        rule(
          "compiler/types.ts",
          &[
            "interface PragmaArgumentSpecification",
            "type ConcretePragmaSpecs",
            "type PragmaArgumentType",
            "type PragmaArgTypeOptional",
            "type PragmaArgTypeMaybeCapture",
          ],
        ),
      ],
      compiler_configs: vec![
        PathBuf::from("src/tsconfig-library-base.json"),
        PathBuf::from("src/tsconfig-base.json"),
      ],
    }
  }
}

impl ExposurePolicy {
  /// Apply the policy to the checkout at `checkout`
  pub fn apply(&self, checkout: &Path) -> TseiResult<ExposureReport> {
    let compiler_config = self.disable_strip_internal(checkout)?;
    let mut report = ExposureReport {
      compiler_config,
      ..ExposureReport::default()
    };

    for rule in &self.rules {
      let path = checkout.join(&self.source_dir).join(&rule.file);
      if !path.exists() {
        warn!("Exposure policy: could not find file {}", path.display());
        report.missing.push(rule.file.clone());
        continue;
      }

      let mut content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
      for declaration in &rule.declarations {
        let (updated, count) = export_declaration(&content, declaration)?;
        content = updated;
        report.exported += count;
      }
      fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    debug!(exported = report.exported, missing = report.missing.len(), "applied exposure policy");
    Ok(report)
  }

  /// Force `compilerOptions.stripInternal = false` in the first existing compiler config
  fn disable_strip_internal(&self, checkout: &Path) -> TseiResult<PathBuf> {
    let path = self
      .compiler_configs
      .iter()
      .map(|candidate| checkout.join(candidate))
      .find(|p| p.exists())
      .ok_or_else(|| {
        TseiError::with_help(
          format!("No compiler config found in {}", checkout.display()),
          "Add the checkout's base compiler config to exposure.compiler_configs in tsei.toml.",
        )
      })?;

    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut json: serde_json::Value =
      serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    let root = json
      .as_object_mut()
      .ok_or_else(|| TseiError::message(format!("{} is not a JSON object", path.display())))?;
    let options = root
      .entry("compilerOptions")
      .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    let options = options
      .as_object_mut()
      .ok_or_else(|| TseiError::message(format!("compilerOptions in {} is not an object", path.display())))?;
    options.insert("stripInternal".to_string(), serde_json::Value::Bool(false));

    fs::write(&path, serde_json::to_string_pretty(&json)?)
      .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
  }
}

/// Prepend `export ` to every line starting (after indentation) with `declaration`
fn export_declaration(content: &str, declaration: &str) -> TseiResult<(String, usize)> {
  let re = Regex::new(&format!(r"(?m)^([ \t]*)({})", regex::escape(declaration)))?;
  let count = re.find_iter(content).count();
  Ok((re.replace_all(content, "${1}export ${2}").into_owned(), count))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn test_export_declaration_keeps_indentation() {
    let src = "namespace ts {\n    const enum Usage {\n        Read\n    }\n    const enum UsageKind {}\n}\n";
    let (out, count) = export_declaration(src, "const enum Usage").unwrap();
    assert_eq!(count, 2);
    assert!(out.contains("\n    export const enum Usage {\n"));
    assert!(out.contains("\n    export const enum UsageKind {}\n"));
  }

  #[test]
  fn test_export_declaration_is_stable() {
    let src = "export type RangeToExtract = number;\n";
    let (out, count) = export_declaration(src, "type RangeToExtract").unwrap();
    assert_eq!(count, 0);
    assert_eq!(out, src);
  }

  #[test]
  fn test_apply_exports_and_disables_strip_internal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/tsconfig-base.json", r#"{ "compilerOptions": { "stripInternal": true } }"#);
    write(
      dir.path(),
      "src/compiler/parser.ts",
      "namespace ts {\n  type PragmaDiagnosticReporter = (pos: number) => void;\n}\n",
    );

    let report = ExposurePolicy::default().apply(dir.path()).unwrap();
    assert_eq!(report.exported, 1);
    assert_eq!(report.compiler_config, dir.path().join("src/tsconfig-base.json"));
    assert_eq!(report.missing.len(), ExposurePolicy::default().rules.len() - 1);

    let parser = fs::read_to_string(dir.path().join("src/compiler/parser.ts")).unwrap();
    assert!(parser.contains("  export type PragmaDiagnosticReporter"));

    let config: serde_json::Value =
      serde_json::from_str(&fs::read_to_string(dir.path().join("src/tsconfig-base.json")).unwrap()).unwrap();
    assert_eq!(config["compilerOptions"]["stripInternal"], false);
  }

  #[test]
  fn test_library_base_config_preferred() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/tsconfig-base.json", "{}");
    write(dir.path(), "src/tsconfig-library-base.json", "{}");

    let report = ExposurePolicy::default().apply(dir.path()).unwrap();
    assert_eq!(report.compiler_config, dir.path().join("src/tsconfig-library-base.json"));

    let untouched = fs::read_to_string(dir.path().join("src/tsconfig-base.json")).unwrap();
    assert_eq!(untouched, "{}");
  }

  #[test]
  fn test_missing_compiler_config_fails() {
    let dir = TempDir::new().unwrap();
    assert!(ExposurePolicy::default().apply(dir.path()).is_err());
  }

  #[test]
  fn test_policy_from_toml() {
    let policy: ExposurePolicy = toml_edit::de::from_str(
      r#"
version = 2
compiler_configs = ["tsconfig.json"]

[[rules]]
file = "lib/a.ts"
declarations = ["interface A"]
"#,
    )
    .unwrap();
    assert_eq!(policy.version, 2);
    assert_eq!(policy.source_dir, PathBuf::from("src"));
    assert_eq!(policy.rules, vec![rule("lib/a.ts", &["interface A"])]);
  }
}
