//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Declarations that transform cleanly
pub const VALID_DECLARATIONS: &str = "declare namespace ts {
    interface Node {
        kind: SyntaxKind;
        parent: Node;
    }
    const enum SyntaxKind {
        Unknown = 0,
        Identifier = 1
    }
    type PerfLogger = any;
    function createNode(kind: ts.SyntaxKind): ts.Node;
}
declare namespace ts.server {
    interface Project {
        root: ts.Node;
    }
}
export = ts;
";

/// Declarations the transformer rejects
pub const BROKEN_DECLARATIONS: &str = "declare namespace ts {
    interface Node {
        kind: ts.MissingKind;
    }
}
export = ts;
";

/// A pipeline root: a git repository with a ledger, package files and a pushable remote
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
  /// Bare repository `origin` points at
  pub remote: PathBuf,
}

impl TestWorkspace {
  /// Create a new workspace with an initial commit pushed to `origin`
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("work");
    let remote = root.path().join("origin.git");
    std::fs::create_dir_all(&path)?;

    git(root.path(), &["init", "--bare", "--initial-branch=main", "origin.git"])?;

    // Initialize git repo with main as default branch
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["remote", "add", "origin", &remote.to_string_lossy()])?;

    std::fs::create_dir_all(path.join("package-files"))?;
    std::fs::write(
      path.join("package-files/package.json"),
      "{\n  \"name\": \"@tsei/typescript\",\n  \"version\": \"0.0.0\",\n  \"private\": true\n}\n",
    )?;
    std::fs::write(path.join("README.md"), "# releases\n")?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial setup"])?;
    git(&path, &["push", "-u", "origin", "main"])?;

    Ok(Self { _root: root, path, remote })
  }

  /// Write `tsei-ledger.json` with the given settings and no records
  pub fn write_ledger(&self, range: &str, skip: &[&str], max_attempts: u32, upstream: &str) -> Result<()> {
    let ledger = serde_json::json!({
      "settings": {
        "acceptedVersionRange": range,
        "skipTags": skip,
        "maxAttempts": max_attempts,
        "upstreamRemoteUrl": upstream,
      },
      "records": [],
    });
    self.write_file("tsei-ledger.json", &serde_json::to_string_pretty(&ledger)?)
  }

  /// Write a file relative to the workspace
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    self.head()
  }

  /// Current HEAD SHA
  pub fn head(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// HEAD of `main` in the bare remote
  pub fn remote_head(&self) -> Result<String> {
    let output = git(&self.remote, &["rev-parse", "main"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Get git log
  pub fn git_log(&self, n: usize) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", &format!("-{}", n), "--format=%s"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Parsed ledger file
  pub fn read_ledger(&self) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(&self.read_file("tsei-ledger.json")?)?)
  }
}

/// An upstream compiler repository with one commit per release tag
///
/// Each tagged tree holds what a built checkout needs: `decl.d.ts`, a
/// `package.json` carrying the version, and a base compiler config.
pub struct UpstreamRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl UpstreamRepo {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Upstream"])?;
    git(&path, &["config", "user.email", "upstream@example.com"])?;

    std::fs::create_dir_all(path.join("src"))?;
    std::fs::write(
      path.join("src/tsconfig-base.json"),
      "{ \"compilerOptions\": { \"stripInternal\": true } }\n",
    )?;

    Ok(Self { _root: root, path })
  }

  /// Commit a release and tag it (annotated, so ls-remote also lists the peeled ref)
  pub fn release(&self, tag: &str, version: &str, declarations: &str) -> Result<()> {
    std::fs::write(self.path.join("decl.d.ts"), declarations)?;
    std::fs::write(
      self.path.join("package.json"),
      format!("{{ \"name\": \"typescript\", \"version\": \"{}\" }}\n", version),
    )?;
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", &format!("Release {}", tag)])?;
    git(&self.path, &["tag", "-a", tag, "-m", tag])?;
    Ok(())
  }

  /// Remote URL for the repository
  pub fn url(&self) -> String {
    format!("file://{}", self.path.display())
  }
}

/// tsei.toml that builds by reading the committed `decl.d.ts`
pub const TEST_CONFIG: &str = r#"
[build]
install = []
build = ["git", "status", "--short"]
declarations = "decl.d.ts"
"#;

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the tsei CLI, returning its output whatever the exit status
pub fn run_tsei(cwd: &Path, args: &[&str]) -> Result<Output> {
  let tsei_bin = env!("CARGO_BIN_EXE_tsei");
  let scratch = cwd.join(".scratch");

  Command::new(tsei_bin)
    .current_dir(cwd)
    .args(args)
    .env("TMP_ROOT_PATH", &scratch)
    .env_remove("DRY_RUN")
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run tsei")
}

/// Run the tsei CLI and fail unless it exits successfully
pub fn run_tsei_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_tsei(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "tsei command failed: tsei {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
