//! Change aggregation across a repository and its submodules
//!
//! The root repository is diffed `base → head`. Every submodule pointer that
//! moved in that range is replaced by the submodule's own diff between the two
//! pinned commits. Expansion stops there: links inside a submodule's diff are
//! not followed.

use crate::core::error::{GitError, ImpactError, ImpactResult};
use crate::core::vcs::{Change, ChangeKind, VersionControlProvider};
use crate::utils::normalize;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Changes reported by one repository, relative to its working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDiff {
  pub working_directory: PathBuf,
  pub changes: Vec<Change>,
}

/// A submodule link that has to be diffed on its own
struct NestedTarget {
  link: PathBuf,
  root: PathBuf,
  old_revision: Option<String>,
  new_revision: String,
}

/// Collects `(working directory, changes)` pairs for the root repository and one
/// level of nested repositories.
pub struct DiffAggregator<'a> {
  vcs: &'a dyn VersionControlProvider,
  expand_nested: bool,
}

impl<'a> DiffAggregator<'a> {
  pub fn new(vcs: &'a dyn VersionControlProvider) -> Self {
    Self {
      vcs,
      expand_nested: true,
    }
  }

  /// Disable submodule expansion; moved links are then dropped with a warning
  pub fn expand_nested(mut self, expand: bool) -> Self {
    self.expand_nested = expand;
    self
  }

  /// Diff `repository_root` from `base` to `head`, expanding submodule links.
  ///
  /// The first pair is always the root repository (with link changes removed),
  /// followed by one pair per expanded link in root-diff order.
  ///
  /// Removed links are skipped with a warning. Moved and added links are looked up
  /// in the `.gitmodules` committed at `head`.
  ///
  /// # Errors
  /// A moved or added link without a registration at `head` is fatal: the workspace
  /// metadata disagrees with the repository and the result could not be trusted.
  pub fn aggregate(&self, repository_root: &Path, base: &str, head: &str) -> ImpactResult<Vec<RepositoryDiff>> {
    let (links, changes): (Vec<Change>, Vec<Change>) = self
      .vcs
      .diff(repository_root, base, head)?
      .into_iter()
      .partition(Change::is_nested_link);

    let mut diffs = vec![RepositoryDiff {
      working_directory: repository_root.to_path_buf(),
      changes,
    }];

    if links.is_empty() {
      return Ok(diffs);
    }

    if !self.expand_nested {
      for link in &links {
        tracing::warn!(link = %link.path.display(), "submodule expansion disabled, link change ignored");
      }
      return Ok(diffs);
    }

    let targets = self.resolve_links(repository_root, head, links)?;

    // Each task opens (and drops) its own repository handle
    let nested = targets
      .par_iter()
      .map(|target| self.diff_nested(target))
      .collect::<ImpactResult<Vec<_>>>()?;

    diffs.extend(nested);
    Ok(diffs)
  }

  /// Match link changes against the submodule registry at `head`
  fn resolve_links(&self, repository_root: &Path, head: &str, links: Vec<Change>) -> ImpactResult<Vec<NestedTarget>> {
    // A removed link loses its registration in the same commit; nothing to diff either
    let links: Vec<(PathBuf, Option<String>, String)> = links
      .into_iter()
      .filter_map(|change| match change.kind {
        ChangeKind::NestedLink {
          old_revision,
          new_revision: Some(new_revision),
        } => Some((normalize(&change.path), old_revision, new_revision)),
        ChangeKind::NestedLink { new_revision: None, .. } => {
          tracing::warn!(link = %change.path.display(), "submodule removed in range, not expanded");
          None
        }
        _ => None,
      })
      .collect();

    if links.is_empty() {
      return Ok(Vec::new());
    }

    let registry: BTreeMap<PathBuf, PathBuf> = self
      .vcs
      .list_nested_repositories(repository_root, head)?
      .into_iter()
      .map(|(link, root)| (normalize(&link), root))
      .collect();

    links
      .into_iter()
      .map(|(link, old_revision, new_revision)| {
        let Some(root) = registry.get(&link) else {
          return Err(ImpactError::Git(GitError::UnregisteredNestedRepository {
            repository: repository_root.to_path_buf(),
            link,
          }));
        };

        Ok(NestedTarget {
          root: root.clone(),
          link,
          old_revision,
          new_revision,
        })
      })
      .collect()
  }

  fn diff_nested(&self, target: &NestedTarget) -> ImpactResult<RepositoryDiff> {
    let changes = match &target.old_revision {
      Some(old) if *old == target.new_revision => Vec::new(),
      Some(old) => self.vcs.diff(&target.root, old, &target.new_revision)?,
      None => self.vcs.diff_from_empty(&target.root, &target.new_revision)?,
    };

    let (inner_links, changes): (Vec<Change>, Vec<Change>) = changes.into_iter().partition(Change::is_nested_link);
    for inner in &inner_links {
      tracing::debug!(
        link = %target.link.display(),
        inner = %inner.path.display(),
        "second-level submodule not expanded"
      );
    }

    tracing::debug!(link = %target.link.display(), changes = changes.len(), "expanded submodule");
    Ok(RepositoryDiff {
      working_directory: target.root.clone(),
      changes,
    })
  }
}

/// True when no repository reported any change (the "no changes" fast path)
pub fn is_unchanged(diffs: &[RepositoryDiff]) -> bool {
  diffs.iter().all(|d| d.changes.is_empty())
}

/// Flatten all pairs into absolute, deduplicated changed paths
pub fn changed_paths(diffs: &[RepositoryDiff]) -> BTreeSet<PathBuf> {
  diffs
    .iter()
    .flat_map(|diff| {
      diff
        .changes
        .iter()
        .filter(|c| !c.is_nested_link())
        .map(|c| normalize(&diff.working_directory.join(&c.path)))
    })
    .collect()
}
