//! Diff and submodule operations for SystemGit

use super::system_git::SystemGit;
use super::{Change, ChangeKind};
use crate::core::error::{GitError, ImpactError, ImpactResult, ResultExt};
use crate::utils::normalize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Mode git uses for submodule entries (gitlinks)
const GITLINK_MODE: &str = "160000";

impl SystemGit {
  /// Changes between two revisions
  ///
  /// Uses `git diff --raw -z --no-renames` so renames show up as delete + add and
  /// submodule pointer moves carry both commit ids.
  pub fn diff_revisions(&self, from: &str, to: &str) -> ImpactResult<Vec<Change>> {
    let stdout = self.run(&[
      "diff",
      "--raw",
      "-z",
      "--no-renames",
      "--no-abbrev",
      "--ignore-submodules=none",
      from,
      to,
      "--",
    ])?;

    let changes = parse_raw_diff(&stdout)?;
    tracing::debug!(
      repo = %self.work_tree.display(),
      from,
      to,
      count = changes.len(),
      "computed diff"
    );
    Ok(changes)
  }

  /// Every entry of `to`, reported as added
  ///
  /// Used for submodules that were introduced in the diffed range and therefore
  /// have no old revision to compare against.
  pub fn diff_from_empty(&self, to: &str) -> ImpactResult<Vec<Change>> {
    let stdout = self.run(&["ls-tree", "-r", "-z", "--full-tree", to])?;
    parse_ls_tree(&stdout)
  }

  /// Submodules registered in `.gitmodules` at `revision`: link path → absolute working tree
  ///
  /// The registry is read from the committed blob, not the checkout, so it always
  /// agrees with the tree the links were diffed against.
  pub fn nested_repositories(&self, revision: &str) -> ImpactResult<BTreeMap<PathBuf, PathBuf>> {
    let blob = format!("{}:.gitmodules", revision);

    let exists = self
      .git_cmd()
      .args(["cat-file", "-e", blob.as_str()])
      .output()
      .context("Failed to execute git cat-file")?;
    if !exists.status.success() {
      tracing::debug!(revision, "no .gitmodules at revision");
      return Ok(BTreeMap::new());
    }

    let output = self
      .git_cmd()
      .args(["config", "--blob", blob.as_str(), "-z", "--get-regexp", r"^submodule\..*\.path$"])
      .output()
      .with_context(|| format!("Failed to read {}", blob))?;

    // Exit code 1 means "no matching keys"
    if output.status.code() == Some(1) {
      return Ok(BTreeMap::new());
    }
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ImpactError::Git(GitError::CommandFailed {
        command: format!("git config --blob {}", blob),
        stderr: stderr.to_string(),
      }));
    }

    let links = parse_gitmodules_paths(&output.stdout)
      .into_iter()
      .map(|link| {
        let root = normalize(&self.work_tree.join(&link));
        (link, root)
      })
      .collect();

    Ok(links)
  }
}

/// Parse `git diff --raw -z` output.
///
/// Records look like `:<old_mode> <new_mode> <old_sha> <new_sha> <status>\0<path>\0`.
fn parse_raw_diff(data: &[u8]) -> ImpactResult<Vec<Change>> {
  let output = String::from_utf8_lossy(data);
  let mut tokens = output.split('\0').filter(|t| !t.is_empty());
  let mut changes = Vec::new();

  while let Some(meta) = tokens.next() {
    let malformed = || {
      ImpactError::Git(GitError::MalformedDiff {
        record: meta.to_string(),
      })
    };

    let fields: Vec<&str> = meta.trim_start_matches(':').split_whitespace().collect();
    if !meta.starts_with(':') || fields.len() < 5 {
      return Err(malformed());
    }
    let path = tokens.next().ok_or_else(malformed)?;

    let (old_mode, new_mode, old_sha, new_sha) = (fields[0], fields[1], fields[2], fields[3]);
    let status = fields[4].chars().next().ok_or_else(malformed)?;

    let kind = if old_mode == GITLINK_MODE || new_mode == GITLINK_MODE {
      ChangeKind::NestedLink {
        old_revision: non_null(old_sha, old_mode),
        new_revision: non_null(new_sha, new_mode),
      }
    } else {
      match status {
        'A' => ChangeKind::Added,
        'D' => ChangeKind::Deleted,
        _ => ChangeKind::Modified,
      }
    };

    changes.push(Change::new(path, kind));
  }

  Ok(changes)
}

/// A side of a gitlink change only carries a revision when it actually was a gitlink
fn non_null(sha: &str, mode: &str) -> Option<String> {
  if mode != GITLINK_MODE || sha.chars().all(|c| c == '0') {
    None
  } else {
    Some(sha.to_string())
  }
}

/// Parse `git ls-tree -r -z` output into added changes.
///
/// Records look like `<mode> <type> <object>\t<path>\0`.
fn parse_ls_tree(data: &[u8]) -> ImpactResult<Vec<Change>> {
  let output = String::from_utf8_lossy(data);
  let mut changes = Vec::new();

  for record in output.split('\0').filter(|r| !r.is_empty()) {
    let (meta, path) = record.split_once('\t').ok_or_else(|| {
      ImpactError::Git(GitError::MalformedDiff {
        record: record.to_string(),
      })
    })?;
    let fields: Vec<&str> = meta.split_whitespace().collect();

    let kind = match fields.as_slice() {
      [mode, _, object] if *mode == GITLINK_MODE => ChangeKind::NestedLink {
        old_revision: None,
        new_revision: Some(object.to_string()),
      },
      _ => ChangeKind::Added,
    };
    changes.push(Change::new(path, kind));
  }

  Ok(changes)
}

/// Parse `git config -z --get-regexp` output: `<key>\n<value>\0` records
fn parse_gitmodules_paths(data: &[u8]) -> Vec<PathBuf> {
  String::from_utf8_lossy(data)
    .split('\0')
    .filter_map(|record| record.split_once('\n'))
    .map(|(_key, value)| PathBuf::from(value.trim_end_matches('/')))
    .collect()
}
