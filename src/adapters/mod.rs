//! Workspace providers
//!
//! A provider turns a workspace descriptor into the list of projects the impact
//! engine works on. The engine never reads descriptors itself; it only sees
//! `Workspace` and `Project`.
//!
//! Currently supports:
//! - Rust (Cargo workspaces)

use crate::core::error::ImpactResult;
use std::path::{Path, PathBuf};

pub mod cargo;

/// A build unit, identified by its descriptor path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
  /// Display name (package name)
  pub name: String,
  /// Absolute, canonical descriptor path (e.g. `.../Cargo.toml`)
  pub descriptor_path: PathBuf,
  /// Directory owning the project's files
  pub root: PathBuf,
  /// Declared references: files or directories, absolute or relative to `root`
  pub references: Vec<PathBuf>,
  /// Imported descriptors, absolute or relative to `root`
  pub imports: Vec<PathBuf>,
}

impl Project {
  /// Project with no references, rooted at the descriptor's directory
  pub fn new(name: impl Into<String>, descriptor_path: impl Into<PathBuf>) -> Self {
    let descriptor_path = descriptor_path.into();
    let root = descriptor_path.parent().map(Path::to_path_buf).unwrap_or_default();
    Self {
      name: name.into(),
      descriptor_path,
      root,
      references: Vec::new(),
      imports: Vec::new(),
    }
  }

  pub fn with_reference(mut self, reference: impl Into<PathBuf>) -> Self {
    self.references.push(reference.into());
    self
  }

  pub fn with_import(mut self, import: impl Into<PathBuf>) -> Self {
    self.imports.push(import.into());
    self
  }
}

/// A parsed workspace
#[derive(Debug, Clone)]
pub struct Workspace {
  /// Workspace root directory (absolute)
  pub root: PathBuf,
  /// Descriptor the workspace was parsed from
  pub descriptor_path: PathBuf,
  /// Projects in descriptor order
  pub projects: Vec<Project>,
}

impl Workspace {
  pub fn new(root: impl Into<PathBuf>, descriptor_path: impl Into<PathBuf>, projects: Vec<Project>) -> Self {
    Self {
      root: root.into(),
      descriptor_path: descriptor_path.into(),
      projects,
    }
  }

  /// Find a project by descriptor path
  pub fn project(&self, descriptor_path: &Path) -> Option<&Project> {
    self.projects.iter().find(|p| p.descriptor_path == descriptor_path)
  }
}

/// Workspace provider trait
///
/// Each ecosystem implements this to turn its descriptor format into projects.
/// A descriptor that cannot be parsed must fail the whole call; a partial
/// project list would under-report impact.
pub trait WorkspaceProvider: Send + Sync {
  fn parse_workspace(&self, descriptor_path: &Path) -> ImpactResult<Workspace>;
}
