pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::ImpactResult;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Kind of change reported by a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
  Added,
  Modified,
  Deleted,
  /// A submodule pointer moved. `None` means the link did not exist on that side.
  NestedLink {
    old_revision: Option<String>,
    new_revision: Option<String>,
  },
}

/// A single changed path, relative to the repository that reported it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
  pub path: PathBuf,
  pub kind: ChangeKind,
}

impl Change {
  pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
    Self {
      path: path.into(),
      kind,
    }
  }

  pub fn is_nested_link(&self) -> bool {
    matches!(self.kind, ChangeKind::NestedLink { .. })
  }
}

/// Version-control backend consumed by the diff aggregator.
///
/// Implementations must open repositories per call; no handle outlives the call
/// that created it, which keeps them usable from rayon workers.
pub trait VersionControlProvider: Send + Sync {
  /// Working tree root of the repository containing `path`
  fn repository_root(&self, path: &Path) -> ImpactResult<PathBuf>;

  /// Changes between two revisions of the repository at `repository_root`
  fn diff(&self, repository_root: &Path, from: &str, to: &str) -> ImpactResult<Vec<Change>>;

  /// Every path present at `to`, reported as added (for links with no old revision)
  fn diff_from_empty(&self, repository_root: &Path, to: &str) -> ImpactResult<Vec<Change>>;

  /// Nested repositories registered at `revision`: link path (relative) → nested working tree (absolute)
  fn list_nested_repositories(
    &self,
    repository_root: &Path,
    revision: &str,
  ) -> ImpactResult<BTreeMap<PathBuf, PathBuf>>;
}
