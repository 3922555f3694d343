//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A test workspace with git history
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a new test workspace with basic structure
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    // Canonical so assertions match the paths the binary reports
    let path = root.path().canonicalize()?;

    init_repo(&path)?;

    // Create workspace Cargo.toml
    std::fs::write(
      path.join("Cargo.toml"),
      r#"[workspace]
members = ["crates/*"]
resolver = "2"

[workspace.package]
edition = "2021"
license = "MIT"
"#,
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial workspace setup"])?;

    Ok(Self { _root: root, path })
  }

  /// Add a crate to the workspace
  pub fn add_crate(&self, name: &str, deps: &[&str]) -> Result<PathBuf> {
    self.add_crate_with_metadata(name, deps, "")
  }

  /// Add a crate with a `[package.metadata.impact]` body
  pub fn add_crate_with_metadata(&self, name: &str, deps: &[&str], impact_metadata: &str) -> Result<PathBuf> {
    let crate_path = self.path.join("crates").join(name);
    std::fs::create_dir_all(crate_path.join("src"))?;

    let mut cargo_toml = format!(
      r#"[package]
name = "{}"
version = "0.1.0"
edition.workspace = true
license.workspace = true
"#,
      name
    );

    if !impact_metadata.is_empty() {
      cargo_toml.push_str(&format!("\n[package.metadata.impact]\n{}\n", impact_metadata));
    }

    cargo_toml.push_str("\n[dependencies]\n");
    for dep in deps {
      cargo_toml.push_str(&format!("{} = {{ path = \"../{}\" }}\n", dep, dep));
    }

    std::fs::write(crate_path.join("Cargo.toml"), cargo_toml)?;
    std::fs::write(
      crate_path.join("src/lib.rs"),
      format!("//! {} crate\n\npub fn hello() -> &'static str {{\n    \"Hello from {}\"\n}}\n", name, name),
    )?;

    Ok(crate_path)
  }

  /// Write a file relative to the workspace root, creating parent directories
  pub fn write_file(&self, rel: &str, content: &str) -> Result<PathBuf> {
    let path = self.path.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    Ok(path)
  }

  /// Modify a file in a crate
  pub fn modify_file(&self, crate_name: &str, file: &str, content: &str) -> Result<()> {
    let file_path = self.path.join("crates").join(crate_name).join(file);
    std::fs::write(file_path, content)?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    commit_all(&self.path, message)
  }

  /// Mark the current commit as the comparison base
  pub fn tag_base(&self) -> Result<()> {
    git(&self.path, &["branch", "base"])?;
    Ok(())
  }

  /// Manifest path of a workspace crate, as reported by the binary
  pub fn manifest(&self, crate_name: &str) -> PathBuf {
    self.path.join("crates").join(crate_name).join("Cargo.toml")
  }
}

/// A standalone repository to be added as a submodule
pub struct UpstreamRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl UpstreamRepo {
  pub fn new(files: &[(&str, &str)]) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().canonicalize()?;
    init_repo(&path)?;

    for (rel, content) in files {
      let file = path.join(rel);
      if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(file, content)?;
    }
    commit_all(&path, "Initial upstream commit")?;

    Ok(Self { _root: root, path })
  }
}

fn init_repo(path: &Path) -> Result<()> {
  git(path, &["init", "--initial-branch=main"])?;
  configure_identity(path)
}

/// Set a commit identity; submodule checkouts need their own
pub fn configure_identity(path: &Path) -> Result<()> {
  git(path, &["config", "user.name", "Test User"])?;
  git(path, &["config", "user.email", "test@example.com"])?;
  git(path, &["config", "commit.gpgsign", "false"])?;
  Ok(())
}

/// Stage everything and commit, returning the new HEAD
pub fn commit_all(path: &Path, message: &str) -> Result<String> {
  git(path, &["add", "."])?;
  git(path, &["commit", "-m", message])?;

  let output = git(path, &["rev-parse", "HEAD"])?;
  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

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

/// Run cargo-impact without checking its exit status
pub fn run_cargo_impact_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let cargo_impact_bin = env!("CARGO_BIN_EXE_cargo-impact");

  Command::new(cargo_impact_bin)
    .current_dir(cwd)
    .arg("impact")
    .args(args)
    .output()
    .context("Failed to run cargo-impact")
}

/// Run cargo-impact CLI command, failing on a non-zero exit
pub fn run_cargo_impact(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_cargo_impact_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "cargo-impact command failed: cargo impact {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run with `--format json` and parse stdout
pub fn run_json(cwd: &Path, args: &[&str]) -> Result<serde_json::Value> {
  let mut full: Vec<&str> = args.to_vec();
  full.extend(["--format", "json"]);
  let output = run_cargo_impact(cwd, &full)?;
  serde_json::from_slice(&output.stdout).context("stdout was not valid JSON")
}

/// String entries of a JSON array at `pointer`
pub fn json_paths(value: &serde_json::Value, pointer: &str) -> Vec<PathBuf> {
  value
    .pointer(pointer)
    .and_then(|v| v.as_array())
    .map(|items| items.iter().filter_map(|i| i.as_str()).map(PathBuf::from).collect())
    .unwrap_or_default()
}
