//! Utility functions for cross-platform path handling

use std::path::{Path, PathBuf};

/// Lexically clean a path: drop `.` segments and fold `..` into its parent.
///
/// Never touches the filesystem, so it works for deleted files reported by a diff.
/// A `..` that would climb above an absolute root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
  path_clean::clean(path)
}

/// Check whether `path` lies inside `dir` (or is `dir` itself).
///
/// Compares whole path segments after normalization, so `/ws/libs/A` does not
/// contain `/ws/libs/AB/file`.
pub fn is_within(path: &Path, dir: &Path) -> bool {
  normalize(path).starts_with(normalize(dir))
}

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Render `path` relative to `root` in Git format, or absolute when outside `root`.
pub fn display_relative(path: &Path, root: &Path) -> String {
  match path.strip_prefix(root) {
    Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
    Ok(rel) => path_to_git_format(rel),
    Err(_) => path_to_git_format(path),
  }
}
