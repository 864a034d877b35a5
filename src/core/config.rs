use crate::core::error::{ConfigError, ResultExt, TseiError, TseiResult};
use crate::decl::TransformOptions;
use crate::release::exposure::ExposurePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `paths.scratch_root`
pub const SCRATCH_ROOT_ENV: &str = "TMP_ROOT_PATH";

/// Configuration for tsei
/// Searched in order: tsei.toml, .tsei.toml, .config/tsei.toml
///
/// Every section is optional; a missing file means all defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TseiConfig {
  pub paths: PathsConfig,
  pub build: BuildConfig,
  pub transform: TransformOptions,
  pub publish: PublishConfig,
  pub exposure: ExposurePolicy,
}

/// File locations, relative to the root unless absolute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
  /// Ledger file (default: tsei-ledger.json)
  pub ledger: PathBuf,

  /// Directory copied verbatim into every published package (default: package-files)
  pub package_files: PathBuf,

  /// Parent of all scratch directories (default: system temp dir + tsei)
  pub scratch_root: Option<PathBuf>,
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      ledger: PathBuf::from("tsei-ledger.json"),
      package_files: PathBuf::from("package-files"),
      scratch_root: None,
    }
  }
}

/// Commands run inside a fresh checkout of a release tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Dependency install command, as argv
  pub install: Vec<String>,

  /// Declaration build command, as argv
  pub build: Vec<String>,

  /// Declaration bundle produced by `build`, relative to the checkout
  pub declarations: PathBuf,

  /// Manifest holding the upstream version, relative to the checkout
  pub manifest: PathBuf,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      install: argv(&["npm", "install", "--no-audit"]),
      build: argv(&["npx", "hereby", "dts"]),
      declarations: PathBuf::from("built/local/typescript.internal.d.ts"),
      manifest: PathBuf::from("package.json"),
    }
  }
}

/// Registry submission settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
  /// Name of the declarations file inside the package (default: typescript.d.ts)
  pub declarations_file: String,

  /// Channel used when a stable release must not take `latest` (default: backport)
  pub backfill_tag: String,
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      declarations_file: "typescript.d.ts".to_string(),
      backfill_tag: "backport".to_string(),
    }
  }
}

fn argv(parts: &[&str]) -> Vec<String> {
  parts.iter().map(|s| s.to_string()).collect()
}

impl TseiConfig {
  /// Find config file in search order: tsei.toml, .tsei.toml, .config/tsei.toml
  pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    let candidates = vec![
      root.join("tsei.toml"),
      root.join(".tsei.toml"),
      root.join(".config").join("tsei.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config for `root`, falling back to defaults when no file exists
  ///
  /// An explicit `config_path` must exist.
  pub fn load(root: &Path, config_path: Option<&Path>) -> TseiResult<Self> {
    let path = match config_path {
      Some(path) => {
        if !path.exists() {
          return Err(TseiError::with_help(
            format!("Config file not found: {}", path.display()),
            "Pass an existing file to --config, or omit it to use tsei.toml from the root.",
          ));
        }
        path.to_path_buf()
      }
      None => match Self::find_config_path(root) {
        Some(path) => path,
        None => return Ok(Self::default()),
      },
    };

    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config = Self::parse(&content).with_context(|| format!("Failed to parse config from {}", path.display()))?;

    config.validate()?;
    Ok(config)
  }

  /// Parse config text
  pub fn parse(content: &str) -> TseiResult<Self> {
    Ok(toml_edit::de::from_str(content)?)
  }

  /// Reject settings no run could succeed with
  pub fn validate(&self) -> TseiResult<()> {
    if self.build.build.is_empty() {
      return Err(invalid("build.build", "build command must not be empty"));
    }
    if self.transform.scope_name.is_empty() {
      return Err(invalid("transform.scope_name", "scope name must not be empty"));
    }
    if self.transform.package_name.is_empty() {
      return Err(invalid("transform.package_name", "package name must not be empty"));
    }
    if self.publish.declarations_file.is_empty() {
      return Err(invalid("publish.declarations_file", "file name must not be empty"));
    }
    if self.publish.backfill_tag.is_empty() {
      return Err(invalid("publish.backfill_tag", "distribution tag must not be empty"));
    }
    Ok(())
  }

  /// Ledger location for `root`
  pub fn ledger_path(&self, root: &Path) -> PathBuf {
    root.join(&self.paths.ledger)
  }

  /// Package files directory for `root`
  pub fn package_files_path(&self, root: &Path) -> PathBuf {
    root.join(&self.paths.package_files)
  }

  /// Scratch root: `TMP_ROOT_PATH`, then `paths.scratch_root`, then the system temp dir
  pub fn scratch_root(&self, root: &Path) -> PathBuf {
    if let Some(dir) = std::env::var_os(SCRATCH_ROOT_ENV).filter(|v| !v.is_empty()) {
      return PathBuf::from(dir);
    }
    match &self.paths.scratch_root {
      Some(dir) => root.join(dir),
      None => std::env::temp_dir().join("tsei"),
    }
  }
}

fn invalid(field: &str, reason: &str) -> TseiError {
  TseiError::Config(ConfigError::InvalidSetting {
    field: field.to_string(),
    reason: reason.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_missing_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = TseiConfig::load(dir.path(), None).unwrap();
    assert_eq!(config, TseiConfig::default());
    assert_eq!(config.build.install, vec!["npm", "install", "--no-audit"]);
    assert_eq!(config.publish.backfill_tag, "backport");
    assert_eq!(config.ledger_path(dir.path()), dir.path().join("tsei-ledger.json"));
  }

  #[test]
  fn test_partial_config_keeps_other_defaults() {
    let config = TseiConfig::parse(
      r#"
[paths]
ledger = "state/ledger.json"

[transform]
package_name = "@scope/compiler"

[build]
build = ["make", "dts"]
"#,
    )
    .unwrap();

    assert_eq!(config.paths.ledger, PathBuf::from("state/ledger.json"));
    assert_eq!(config.paths.package_files, PathBuf::from("package-files"));
    assert_eq!(config.transform.package_name, "@scope/compiler");
    assert_eq!(config.transform.scope_name, "ts");
    assert_eq!(config.build.build, vec!["make", "dts"]);
    assert_eq!(config.build.install, vec!["npm", "install", "--no-audit"]);
  }

  #[test]
  fn test_config_file_discovery() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".config")).unwrap();
    fs::write(
      dir.path().join(".config").join("tsei.toml"),
      "[publish]\nbackfill_tag = \"legacy\"\n",
    )
    .unwrap();

    let config = TseiConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.publish.backfill_tag, "legacy");
  }

  #[test]
  fn test_explicit_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(TseiConfig::load(dir.path(), Some(&missing)).is_err());
  }

  #[test]
  fn test_empty_build_command_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tsei.toml"), "[build]\nbuild = []\n").unwrap();
    let err = TseiConfig::load(dir.path(), None).unwrap_err();
    assert!(matches!(err, TseiError::Config(ConfigError::InvalidSetting { .. })));
  }

  #[test]
  fn test_malformed_config_fails() {
    assert!(TseiConfig::parse("[paths\nledger = 1").is_err());
  }
}
