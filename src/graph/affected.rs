//! Affected project resolution
//!
//! Given the changed paths and the reverse dependency map, determine:
//! - Which projects directly contain a changed path (structural membership)
//! - Which projects are reached from there through the reverse map
//! - Which changed paths nobody claims
//!
//! Resolution is a worklist closure. A node is marked visited before its
//! dependents are expanded, so reference cycles terminate.

use super::reverse_map::ReverseDependencyMap;
use crate::adapters::Workspace;
use crate::utils::{is_within, normalize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Complete impact analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImpactAnalysis {
  /// Changed paths that took part in resolution (workspace root excluded)
  pub changed_paths: BTreeSet<PathBuf>,

  /// Projects whose root contains a changed path
  pub direct: BTreeSet<PathBuf>,

  /// Projects reached only through the reverse map
  pub dependents: BTreeSet<PathBuf>,

  /// Every affected project descriptor (direct + dependents)
  pub affected: BTreeSet<PathBuf>,

  /// Changed paths no project contains or references
  pub unclaimed: BTreeSet<PathBuf>,
}

/// Result of one impact run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpactOutcome {
  /// Every diff was empty; the graph was never built
  NoChanges,
  Analyzed(ImpactAnalysis),
}

impl ImpactOutcome {
  pub fn is_no_changes(&self) -> bool {
    matches!(self, Self::NoChanges)
  }

  pub fn analysis(&self) -> Option<&ImpactAnalysis> {
    match self {
      Self::NoChanges => None,
      Self::Analyzed(analysis) => Some(analysis),
    }
  }
}

/// Computes the affected set for a workspace and its reverse map
pub struct ImpactResolver<'a> {
  workspace: &'a Workspace,
  map: &'a ReverseDependencyMap,
}

impl<'a> ImpactResolver<'a> {
  pub fn new(workspace: &'a Workspace, map: &'a ReverseDependencyMap) -> Self {
    Self { workspace, map }
  }

  pub fn resolve(&self, changed_paths: &BTreeSet<PathBuf>) -> ImpactAnalysis {
    let root = normalize(&self.workspace.root);
    let mut analysis = ImpactAnalysis::default();
    let mut worklist: Vec<PathBuf> = Vec::new();

    for changed in changed_paths {
      let changed = normalize(changed);
      if changed == root {
        tracing::debug!("change at workspace root names no project, discarded");
        continue;
      }

      let seeds = self.seeds(&changed, &root);
      let owners: Vec<&Path> = self
        .workspace
        .projects
        .iter()
        .filter(|p| is_within(&changed, &p.root))
        .map(|p| p.descriptor_path.as_path())
        .collect();

      let referenced = seeds
        .iter()
        .any(|s| self.map.dependents(s).is_some_and(|d| !d.is_empty()));
      if owners.is_empty() && !referenced {
        analysis.unclaimed.insert(changed.clone());
      }

      for owner in owners {
        analysis.direct.insert(owner.to_path_buf());
        worklist.push(owner.to_path_buf());
      }
      worklist.extend(seeds);
      analysis.changed_paths.insert(changed);
    }

    let visited = self.close(worklist);
    analysis.affected = self
      .workspace
      .projects
      .iter()
      .map(|p| p.descriptor_path.clone())
      .filter(|d| visited.contains(d))
      .collect();
    analysis.dependents = analysis.affected.difference(&analysis.direct).cloned().collect();

    tracing::debug!(
      changed = analysis.changed_paths.len(),
      direct = analysis.direct.len(),
      dependents = analysis.dependents.len(),
      unclaimed = analysis.unclaimed.len(),
      "resolved impact"
    );
    analysis
  }

  /// The changed path itself (file rule) plus each enclosing directory below
  /// the workspace root, so a referenced directory matches changes inside it.
  fn seeds(&self, changed: &Path, root: &Path) -> Vec<PathBuf> {
    let mut seeds = vec![changed.to_path_buf()];
    seeds.extend(
      changed
        .ancestors()
        .skip(1)
        .take_while(|dir| *dir != root && is_within(dir, root))
        .map(Path::to_path_buf),
    );
    seeds
  }

  fn close(&self, mut worklist: Vec<PathBuf>) -> BTreeSet<PathBuf> {
    let mut visited = BTreeSet::new();
    while let Some(node) = worklist.pop() {
      if visited.contains(&node) {
        continue;
      }
      if let Some(dependents) = self.map.dependents(&node) {
        worklist.extend(dependents.iter().filter(|d| !visited.contains(*d)).cloned());
      }
      visited.insert(node);
    }
    visited
  }
}
