//! Manifest inspection
//!
//! cargo_metadata resolves inheritance away, so whether a member pulls values
//! from the workspace root has to be read from the raw manifest.

use crate::core::error::{ImpactError, ImpactResult, ResultExt, WorkspaceError};
use std::fs;
use std::path::Path;
use toml_edit::{DocumentMut, Item, TableLike};

const DEPENDENCY_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// What the impact engine needs to know about a single Cargo.toml
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestInfo {
  /// Any `*.workspace = true` key (package fields, dependencies, lints)
  pub inherits_workspace: bool,
}

/// Parse a package manifest
pub fn inspect(manifest_path: &Path) -> ImpactResult<ManifestInfo> {
  let content = fs::read_to_string(manifest_path)
    .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;
  inspect_str(&content).map_err(|reason| {
    ImpactError::Workspace(WorkspaceError::DescriptorParse {
      path: manifest_path.to_path_buf(),
      reason,
    })
  })
}

fn inspect_str(content: &str) -> Result<ManifestInfo, String> {
  let doc = content.parse::<DocumentMut>().map_err(|e| e.to_string())?;

  let package_inherits = doc
    .get("package")
    .and_then(Item::as_table_like)
    .is_some_and(any_entry_inherits);

  let lints_inherit = doc.get("lints").and_then(Item::as_table_like).is_some_and(is_workspace_marker);

  let deps_inherit = DEPENDENCY_TABLES
    .iter()
    .filter_map(|name| doc.get(name).and_then(Item::as_table_like))
    .any(any_entry_inherits);

  let target_deps_inherit = doc
    .get("target")
    .and_then(Item::as_table_like)
    .is_some_and(|targets| {
      targets.iter().any(|(_cfg, item)| {
        item.as_table_like().is_some_and(|target| {
          DEPENDENCY_TABLES
            .iter()
            .filter_map(|name| target.get(name).and_then(Item::as_table_like))
            .any(any_entry_inherits)
        })
      })
    });

  Ok(ManifestInfo {
    inherits_workspace: package_inherits || lints_inherit || deps_inherit || target_deps_inherit,
  })
}

fn any_entry_inherits(table: &dyn TableLike) -> bool {
  table
    .iter()
    .any(|(_key, item)| item.as_table_like().is_some_and(is_workspace_marker))
}

fn is_workspace_marker(table: &dyn TableLike) -> bool {
  table.get("workspace").and_then(Item::as_bool).unwrap_or(false)
}
