use crate::core::error::{ImpactError, ImpactResult, WorkspaceError};
use cargo_metadata::{MetadataCommand, Package};
use std::path::Path;

/// Workspace introspection using cargo_metadata
#[derive(Clone)]
pub struct WorkspaceMetadata {
  metadata: cargo_metadata::Metadata,
}

impl WorkspaceMetadata {
  /// Load metadata for the workspace described by `manifest_path`.
  ///
  /// Runs `cargo metadata --no-deps`: only members are needed, path dependencies
  /// are still listed on each member.
  pub fn load(manifest_path: &Path) -> ImpactResult<Self> {
    let metadata = MetadataCommand::new()
      .manifest_path(manifest_path)
      .no_deps()
      .exec()
      .map_err(|e| {
        ImpactError::Workspace(WorkspaceError::DescriptorParse {
          path: manifest_path.to_path_buf(),
          reason: e.to_string(),
        })
      })?;
    Ok(Self { metadata })
  }

  pub fn list_crates(&self) -> Vec<&Package> {
    self.metadata.workspace_packages()
  }

  pub fn workspace_root(&self) -> &Path {
    self.metadata.workspace_root.as_std_path()
  }
}
