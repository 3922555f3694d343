//! System git backend - zero dependencies, maximum performance
//!
//! Uses git plumbing commands for all operations:
//! - `rev-parse --show-toplevel` to locate working trees
//! - `diff --raw -z` for machine-readable change lists (including submodule links)
//! - `config --blob <rev>:.gitmodules` for the submodule registry
//!
//! Every command runs in an isolated environment so user config cannot change output.

use super::{Change, VersionControlProvider};
use crate::core::error::{GitError, ImpactError, ImpactResult, ResultExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> ImpactResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") || stderr.contains("cannot change to") {
        return Err(ImpactError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ImpactError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = PathBuf::from(stdout.trim());
    // Canonical so paths joined onto it compare equal to canonical manifest paths
    let work_tree = work_tree.canonicalize().unwrap_or(work_tree);

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree,
    })
  }

  /// Working tree root (canonical)
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Run a git command and return stdout, mapping failures to `GitError::CommandFailed`
  pub(crate) fn run(&self, args: &[&str]) -> ImpactResult<Vec<u8>> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ImpactError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: stderr.to_string(),
      }));
    }

    Ok(output.stdout)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    // Set working directory
    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
    cmd.arg("-c").arg("diff.ignoreSubmodules=none"); // Submodule links must always be reported

    cmd
  }
}

/// Stateless provider: each call opens its own `SystemGit` and drops it on return.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGitProvider;

impl VersionControlProvider for SystemGitProvider {
  fn repository_root(&self, path: &Path) -> ImpactResult<PathBuf> {
    Ok(SystemGit::open(path)?.work_tree().to_path_buf())
  }

  fn diff(&self, repository_root: &Path, from: &str, to: &str) -> ImpactResult<Vec<Change>> {
    let git = SystemGit::open(repository_root)?;
    git.diff_revisions(from, to)
  }

  fn diff_from_empty(&self, repository_root: &Path, to: &str) -> ImpactResult<Vec<Change>> {
    let git = SystemGit::open(repository_root)?;
    git.diff_from_empty(to)
  }

  fn list_nested_repositories(
    &self,
    repository_root: &Path,
    revision: &str,
  ) -> ImpactResult<BTreeMap<PathBuf, PathBuf>> {
    let git = SystemGit::open(repository_root)?;
    git.nested_repositories(revision)
  }
}
