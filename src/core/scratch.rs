//! Scratch directories
//!
//! Each logical operation (tag listing, a tag build, publish staging) owns one
//! directory under the scratch root. It is removed when the returned
//! [`TempDir`] drops, on every exit path.

use crate::core::error::{ResultExt, TseiResult};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

/// Create a fresh scratch directory named `<prefix>-XXXXXX` under `root`
pub fn scratch_dir(root: &Path, prefix: &str) -> TseiResult<TempDir> {
  fs::create_dir_all(root).with_context(|| format!("Failed to create scratch root {}", root.display()))?;

  let dir = tempfile::Builder::new()
    .prefix(&format!("{}-", prefix))
    .tempdir_in(root)
    .with_context(|| format!("Failed to create scratch directory under {}", root.display()))?;

  debug!(path = %dir.path().display(), "created scratch directory");
  Ok(dir)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_scratch_dir_removed_on_drop() {
    let root = TempDir::new().unwrap();
    let nested = root.path().join("a").join("b");

    let dir = scratch_dir(&nested, "build").unwrap();
    let path = dir.path().to_path_buf();
    assert!(path.is_dir());
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("build-"));

    drop(dir);
    assert!(!path.exists());
  }

  #[test]
  fn test_scratch_dirs_are_distinct() {
    let root = TempDir::new().unwrap();
    let a = scratch_dir(root.path(), "publish").unwrap();
    let b = scratch_dir(root.path(), "publish").unwrap();
    assert_ne!(a.path(), b.path());
  }
}
