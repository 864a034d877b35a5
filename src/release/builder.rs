//! Builds the internal declaration bundle of one upstream tag

use crate::core::config::BuildConfig;
use crate::core::error::{ResultExt, TseiError, TseiResult};
use crate::core::exec::run_command;
use crate::core::vcs::SystemGit;
use crate::release::exposure::ExposurePolicy;
use crate::release::pipeline::DeclarationBuilder;
use std::fs;
use std::path::Path;
use tracing::info;

/// Result of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
  /// Raw declaration bundle text
  pub declarations: String,
  /// Version from the checkout's manifest
  pub version: String,
}

/// Clone, expose, install, build, collect
pub struct CommandBuilder {
  build: BuildConfig,
  exposure: ExposurePolicy,
}

impl CommandBuilder {
  pub fn new(build: BuildConfig, exposure: ExposurePolicy) -> Self {
    Self { build, exposure }
  }
}

impl DeclarationBuilder for CommandBuilder {
  fn build(&self, remote: &str, tag: &str, scratch: &Path) -> TseiResult<BuildOutput> {
    info!("[{}] Building declarations...", tag);

    SystemGit::at(scratch).clone_tag(remote, tag)?;

    let report = self.exposure.apply(scratch)?;
    info!(
      "[{}] Exposed {} declarations ({} files missing)",
      tag,
      report.exported,
      report.missing.len()
    );

    if !self.build.install.is_empty() {
      run_command(&self.build.install, scratch)?;
    }
    run_command(&self.build.build, scratch)?;

    read_output(scratch, &self.build)
  }
}

/// Read the declaration bundle and manifest version out of a built checkout
pub fn read_output(checkout: &Path, build: &BuildConfig) -> TseiResult<BuildOutput> {
  let declarations_path = checkout.join(&build.declarations);
  let declarations = fs::read_to_string(&declarations_path)
    .with_context(|| format!("Declarations file does not exist: {}", declarations_path.display()))?;

  let manifest_path = checkout.join(&build.manifest);
  let manifest = fs::read_to_string(&manifest_path)
    .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;
  let manifest: serde_json::Value =
    serde_json::from_str(&manifest).with_context(|| format!("Failed to parse manifest {}", manifest_path.display()))?;

  let version = manifest
    .get("version")
    .and_then(|v| v.as_str())
    .ok_or_else(|| TseiError::message(format!("No version in {}", manifest_path.display())))?
    .to_string();

  Ok(BuildOutput { declarations, version })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_read_output() {
    let dir = TempDir::new().unwrap();
    let build = BuildConfig::default();
    fs::create_dir_all(dir.path().join("built/local")).unwrap();
    fs::write(dir.path().join("built/local/typescript.internal.d.ts"), "declare namespace ts {}\n").unwrap();
    fs::write(dir.path().join("package.json"), r#"{ "name": "typescript", "version": "5.4.0-beta" }"#).unwrap();

    let output = read_output(dir.path(), &build).unwrap();
    assert_eq!(output.version, "5.4.0-beta");
    assert_eq!(output.declarations, "declare namespace ts {}\n");
  }

  #[test]
  fn test_read_output_without_declarations_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), r#"{ "version": "1.0.0" }"#).unwrap();
    let err = read_output(dir.path(), &BuildConfig::default()).unwrap_err();
    assert!(err.to_string().contains("Declarations file does not exist"));
  }

  #[test]
  fn test_read_output_without_version_fails() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("built/local")).unwrap();
    fs::write(dir.path().join("built/local/typescript.internal.d.ts"), "").unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    assert!(read_output(dir.path(), &BuildConfig::default()).is_err());
  }
}
