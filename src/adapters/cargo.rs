//! Cargo workspace provider

use super::{Project, Workspace, WorkspaceProvider};
use crate::cargo::manifest;
use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::error::{ImpactError, ImpactResult, WorkspaceError};
use cargo_metadata::Package;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Options controlling which references a Cargo package declares
#[derive(Debug, Clone)]
pub struct CargoOptions {
  /// Include target sources, readme and license file as references
  pub track_sources: bool,
  /// Imports added to every package, relative to the workspace root
  pub global_imports: Vec<PathBuf>,
}

impl Default for CargoOptions {
  fn default() -> Self {
    Self {
      track_sources: true,
      global_imports: Vec::new(),
    }
  }
}

/// Reads a Cargo workspace into projects.
///
/// Per package:
/// - references: target source files, `readme`, `license-file`, the manifest of
///   every path dependency, and `[package.metadata.impact] references`
/// - imports: the workspace root manifest when the package inherits from it,
///   `[package.metadata.impact] imports`, and the configured global imports
pub struct CargoWorkspace {
  options: CargoOptions,
}

impl CargoWorkspace {
  pub fn new(options: CargoOptions) -> Self {
    Self { options }
  }

  fn project_from_package(&self, package: &Package, workspace_root: &Path, root_manifest: &Path) -> ImpactResult<Project> {
    let manifest_path = package.manifest_path.as_std_path();
    let descriptor_path = canonical_descriptor(manifest_path)?;
    let mut project = Project::new(package.name.as_ref().to_string(), descriptor_path);

    if self.options.track_sources {
      for target in &package.targets {
        project.references.push(target.src_path.clone().into_std_path_buf());
      }
      if let Some(readme) = &package.readme {
        project.references.push(readme.clone().into_std_path_buf());
      }
      if let Some(license_file) = &package.license_file {
        project.references.push(license_file.clone().into_std_path_buf());
      }
    }

    for dep_dir in package.dependencies.iter().filter_map(|dep| dep.path.as_ref()) {
      project = project.with_reference(dep_dir.as_std_path().join("Cargo.toml"));
    }

    let declared = package.metadata.get("impact");
    project.references.extend(string_list(declared, "references"));
    project.imports.extend(string_list(declared, "imports"));

    if manifest::inspect(&project.descriptor_path)?.inherits_workspace {
      project = project.with_import(root_manifest);
    }

    for import in &self.options.global_imports {
      project = project.with_import(workspace_root.join(import));
    }

    tracing::trace!(
      package = %project.name,
      references = project.references.len(),
      imports = project.imports.len(),
      "declared package references"
    );
    Ok(project)
  }
}

impl Default for CargoWorkspace {
  fn default() -> Self {
    Self::new(CargoOptions::default())
  }
}

impl WorkspaceProvider for CargoWorkspace {
  fn parse_workspace(&self, descriptor_path: &Path) -> ImpactResult<Workspace> {
    let descriptor_path = canonical_descriptor(descriptor_path)?;
    let metadata = WorkspaceMetadata::load(&descriptor_path)?;

    let workspace_root = metadata.workspace_root();
    let workspace_root = workspace_root
      .canonicalize()
      .unwrap_or_else(|_| workspace_root.to_path_buf());
    let root_manifest = workspace_root.join("Cargo.toml");

    // Manifests are independent; any parse failure fails the whole workspace
    let projects = metadata
      .list_crates()
      .par_iter()
      .map(|package| self.project_from_package(package, &workspace_root, &root_manifest))
      .collect::<ImpactResult<Vec<_>>>()?;

    tracing::debug!(
      root = %workspace_root.display(),
      projects = projects.len(),
      "parsed cargo workspace"
    );
    Ok(Workspace::new(workspace_root, descriptor_path, projects))
  }
}

fn canonical_descriptor(path: &Path) -> ImpactResult<PathBuf> {
  path.canonicalize().map_err(|e| {
    ImpactError::Workspace(WorkspaceError::DescriptorParse {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })
  })
}

/// `[package.metadata.impact] <key> = ["..."]`, ignoring non-string entries
fn string_list(table: Option<&serde_json::Value>, key: &str) -> Vec<PathBuf> {
  table
    .and_then(|t| t.get(key))
    .and_then(|v| v.as_array())
    .map(|items| items.iter().filter_map(|i| i.as_str()).map(PathBuf::from).collect())
    .unwrap_or_default()
}
