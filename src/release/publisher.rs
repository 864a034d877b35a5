//! Stages and submits the public declaration package

use crate::core::config::PublishConfig;
use crate::core::error::{ResultExt, TseiError, TseiResult};
use crate::core::exec::run_command;
use crate::core::scratch::scratch_dir;
use crate::release::dist_tag::DistTag;
use crate::release::pipeline::Publisher;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything needed to publish one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
  pub tag: String,
  pub declarations: String,
  pub version: String,
  pub dist_tag: DistTag,
  pub dry_run: bool,
}

/// Publishes with `npm publish` from a staged copy of the package files
pub struct NpmPublisher {
  package_files: PathBuf,
  scratch_root: PathBuf,
  config: PublishConfig,
}

impl NpmPublisher {
  pub fn new(package_files: PathBuf, scratch_root: PathBuf, config: PublishConfig) -> Self {
    Self {
      package_files,
      scratch_root,
      config,
    }
  }

  /// Copy package files into `dest`, write the declarations, fix up the manifest
  pub fn stage(&self, request: &PublishRequest, dest: &Path) -> TseiResult<()> {
    info!("[{}] Copying package files...", request.tag);
    copy_dir(&self.package_files, dest)
      .with_context(|| format!("Failed to copy package files from {}", self.package_files.display()))?;

    info!("[{}] Writing declarations & package...", request.tag);
    let declarations_path = dest.join(&self.config.declarations_file);
    fs::write(&declarations_path, &request.declarations)
      .with_context(|| format!("Failed to write {}", declarations_path.display()))?;

    rewrite_manifest(&dest.join("package.json"), &request.version)
  }

  /// Registry channel for `dist_tag`; npm always applies one
  pub fn channel(&self, dist_tag: &DistTag) -> String {
    match dist_tag {
      DistTag::Named(name) => name.clone(),
      DistTag::Untagged => self.config.backfill_tag.clone(),
    }
  }

  /// `npm publish` arguments for `request`
  pub fn publish_args(&self, request: &PublishRequest) -> Vec<String> {
    let mut args = vec![
      "npm".to_string(),
      "publish".to_string(),
      "--ignore-scripts".to_string(),
      "--tag".to_string(),
      self.channel(&request.dist_tag),
    ];
    if request.dry_run {
      args.push("--dry-run".to_string());
    }
    args
  }
}

impl Publisher for NpmPublisher {
  fn publish(&self, request: &PublishRequest) -> TseiResult<()> {
    let dir = scratch_dir(&self.scratch_root, "publish")?;
    self.stage(request, dir.path())?;

    info!(
      "[{}] Publishing {} (tag: {})...",
      request.tag,
      request.version,
      self.channel(&request.dist_tag)
    );
    run_command(&self.publish_args(request), dir.path())?;
    Ok(())
  }
}

/// Set `version` and drop `private` in a package manifest
fn rewrite_manifest(path: &Path, version: &str) -> TseiResult<()> {
  let content = fs::read_to_string(path).with_context(|| format!("Package manifest not found: {}", path.display()))?;
  let mut manifest: serde_json::Value =
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

  let fields = manifest
    .as_object_mut()
    .ok_or_else(|| TseiError::message(format!("{} is not a JSON object", path.display())))?;
  fields.insert("version".to_string(), serde_json::Value::String(version.to_string()));
  fields.remove("private");

  fs::write(path, serde_json::to_string_pretty(&manifest)?).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> TseiResult<()> {
  for entry in fs::read_dir(src)? {
    let entry = entry?;
    let target = dest.join(entry.file_name());
    if entry.file_type()?.is_dir() {
      fs::create_dir_all(&target)?;
      copy_dir(&entry.path(), &target)?;
    } else {
      fs::copy(entry.path(), &target)?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn request(dist_tag: DistTag, dry_run: bool) -> PublishRequest {
    PublishRequest {
      tag: "v5.0.0".to_string(),
      declarations: "declare module \"typescript\" { }\n".to_string(),
      version: "5.0.0".to_string(),
      dist_tag,
      dry_run,
    }
  }

  fn publisher(package_files: &Path, scratch: &Path) -> NpmPublisher {
    NpmPublisher::new(package_files.to_path_buf(), scratch.to_path_buf(), PublishConfig::default())
  }

  #[test]
  fn test_stage_package() {
    let files = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    fs::write(
      files.path().join("package.json"),
      r#"{ "name": "@tsei/typescript", "version": "0.0.0", "private": true }"#,
    )
    .unwrap();
    fs::write(files.path().join("README.md"), "readme").unwrap();

    let publisher = publisher(files.path(), dest.path());
    publisher.stage(&request(DistTag::latest(), false), dest.path()).unwrap();

    let manifest: serde_json::Value =
      serde_json::from_str(&fs::read_to_string(dest.path().join("package.json")).unwrap()).unwrap();
    assert_eq!(manifest["version"], "5.0.0");
    assert_eq!(manifest["name"], "@tsei/typescript");
    assert!(manifest.get("private").is_none());
    assert_eq!(fs::read_to_string(dest.path().join("README.md")).unwrap(), "readme");
    assert!(
      fs::read_to_string(dest.path().join("typescript.d.ts"))
        .unwrap()
        .starts_with("declare module")
    );
  }

  #[test]
  fn test_stage_without_manifest_fails() {
    let files = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let publisher = publisher(files.path(), dest.path());
    assert!(publisher.stage(&request(DistTag::latest(), false), dest.path()).is_err());
  }

  #[test]
  fn test_publish_args() {
    let dir = TempDir::new().unwrap();
    let publisher = publisher(dir.path(), dir.path());

    assert_eq!(
      publisher.publish_args(&request(DistTag::Named("beta".to_string()), false)),
      vec!["npm", "publish", "--ignore-scripts", "--tag", "beta"]
    );
    assert_eq!(
      publisher.publish_args(&request(DistTag::Untagged, true)),
      vec!["npm", "publish", "--ignore-scripts", "--tag", "backport", "--dry-run"]
    );
  }
}
