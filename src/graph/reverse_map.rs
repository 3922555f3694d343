//! Reverse dependency map
//!
//! Maps every referenced item (file, directory, imported descriptor) to the set
//! of projects that reference it. Built in two phases:
//!
//! 1. **Resolve** (parallel): each project's declared references and imports are
//!    resolved against its root and checked on disk. Touches no shared state.
//! 2. **Merge** (sequential): the resolved lists are folded into one map.
//!
//! The map is immutable once built.

use crate::adapters::{Project, Workspace};
use crate::ui::progress::ResolutionProgress;
use crate::utils::{display_relative, is_within};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Referenced item → dependent project descriptor paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseDependencyMap {
  entries: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl ReverseDependencyMap {
  /// Projects referencing `item`; `None` means no known dependents
  pub fn dependents(&self, item: &Path) -> Option<&BTreeSet<PathBuf>> {
    self.entries.get(item)
  }

  /// Map from explicit `(item, dependent)` edges, every project keyed
  #[cfg(test)]
  pub(crate) fn from_edges<'p>(
    projects: impl IntoIterator<Item = &'p Path>,
    edges: impl IntoIterator<Item = (&'p str, &'p str)>,
  ) -> Self {
    let mut entries: BTreeMap<PathBuf, BTreeSet<PathBuf>> =
      projects.into_iter().map(|p| (p.to_path_buf(), BTreeSet::new())).collect();
    for (item, dependent) in edges {
      entries.entry(PathBuf::from(item)).or_default().insert(PathBuf::from(dependent));
    }
    Self { entries }
  }

  /// Render project-to-project impact edges among `projects` as Graphviz DOT.
  ///
  /// An edge `X -> Y` means a change owned by X impacts Y. An item is owned by
  /// the project with the deepest root containing it, so a package at the
  /// workspace root does not own the items of the members below it.
  pub fn to_dot(&self, workspace: &Workspace, projects: &BTreeSet<PathBuf>) -> String {
    let mut graph: DiGraph<String, &str> = DiGraph::new();
    let mut nodes: BTreeMap<&Path, NodeIndex> = BTreeMap::new();
    let members: Vec<&Project> = workspace
      .projects
      .iter()
      .filter(|p| projects.contains(&p.descriptor_path))
      .collect();

    for project in &members {
      let idx = graph.add_node(project.name.clone());
      nodes.insert(project.descriptor_path.as_path(), idx);
    }

    let mut edges = BTreeSet::new();
    for (item, dependents) in &self.entries {
      let Some(owner) = owner_of(workspace, item) else {
        continue;
      };
      let Some(&from) = nodes.get(owner.descriptor_path.as_path()) else {
        continue;
      };

      for dependent in dependents.iter().filter(|d| **d != owner.descriptor_path) {
        if let Some(&to) = nodes.get(dependent.as_path()) {
          edges.insert((from, to));
        }
      }
    }

    for (from, to) in edges {
      graph.add_edge(from, to, "");
    }

    format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
  }
}

/// Project with the deepest root containing `item`
fn owner_of<'w>(workspace: &'w Workspace, item: &Path) -> Option<&'w Project> {
  workspace
    .projects
    .iter()
    .filter(|p| p.descriptor_path == item || is_within(item, &p.root))
    .max_by_key(|p| p.root.components().count())
}

/// Items one project depends on, already resolved to existing canonical paths
struct ResolvedProject<'a> {
  descriptor_path: &'a Path,
  items: Vec<PathBuf>,
}

/// Builds a [`ReverseDependencyMap`] from a parsed workspace
pub struct DependencyGraphBuilder<'a> {
  workspace: &'a Workspace,
  progress: Option<&'a ResolutionProgress>,
}

impl<'a> DependencyGraphBuilder<'a> {
  pub fn new(workspace: &'a Workspace) -> Self {
    Self {
      workspace,
      progress: None,
    }
  }

  /// Tick `progress` once per resolved project
  pub fn with_progress(mut self, progress: &'a ResolutionProgress) -> Self {
    self.progress = Some(progress);
    self
  }

  pub fn build(&self) -> ReverseDependencyMap {
    let resolved: Vec<ResolvedProject<'_>> = self
      .workspace
      .projects
      .par_iter()
      .map(|project| {
        let items = self.resolve_project(project);
        if let Some(progress) = self.progress {
          progress.inc();
        }
        ResolvedProject {
          descriptor_path: &project.descriptor_path,
          items,
        }
      })
      .collect();

    let map = merge(&self.workspace.projects, resolved);
    tracing::debug!(
      projects = self.workspace.projects.len(),
      items = map.entries.len(),
      "built reverse dependency map"
    );
    map
  }

  fn resolve_project(&self, project: &Project) -> Vec<PathBuf> {
    let mut items: Vec<PathBuf> = project
      .references
      .iter()
      .filter_map(|reference| resolve_existing(&project.root, reference))
      .collect();

    for import in &project.imports {
      match resolve_existing(&project.root, import) {
        Some(path) if is_within(&path, &self.workspace.root) => items.push(path),
        Some(path) => {
          tracing::trace!(
            project = %project.name,
            import = %path.display(),
            "import outside workspace, not tracked"
          );
        }
        None => {}
      }
    }

    tracing::trace!(
      project = %project.name,
      root = %display_relative(&project.root, &self.workspace.root),
      items = items.len(),
      "resolved references"
    );
    items
  }
}

/// Rooted paths are used as-is, relative ones are joined to `root`.
/// Anything that does not exist right now is dropped.
fn resolve_existing(root: &Path, item: &Path) -> Option<PathBuf> {
  let candidate = if item.is_absolute() {
    item.to_path_buf()
  } else {
    root.join(item)
  };
  candidate.canonicalize().ok()
}

fn merge(projects: &[Project], resolved: Vec<ResolvedProject<'_>>) -> ReverseDependencyMap {
  let mut entries: BTreeMap<PathBuf, BTreeSet<PathBuf>> = projects
    .iter()
    .map(|p| (p.descriptor_path.clone(), BTreeSet::new()))
    .collect();

  for project in resolved {
    for item in project.items {
      entries
        .entry(item)
        .or_default()
        .insert(project.descriptor_path.to_path_buf());
    }
  }

  ReverseDependencyMap { entries }
}
