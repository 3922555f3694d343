//! Integration tests for submodule expansion

use crate::helpers::{
  TestWorkspace, UpstreamRepo, commit_all, configure_identity, git, json_paths, run_cargo_impact, run_cargo_impact_raw,
  run_json,
};
use anyhow::Result;
use std::path::PathBuf;

/// Check out `upstream` as the `vendor/core` submodule (staged, not committed)
fn add_submodule(ws: &TestWorkspace, upstream: &UpstreamRepo) -> Result<()> {
  let upstream_path = upstream.path.to_string_lossy().to_string();
  git(
    &ws.path,
    &["-c", "protocol.file.allow=always", "submodule", "add", upstream_path.as_str(), "vendor/core"],
  )?;
  configure_identity(&ws.path.join("vendor/core"))
}

/// Crates around `vendor/core`: one referencing it, one unrelated
fn add_crates(ws: &TestWorkspace) -> Result<()> {
  ws.add_crate_with_metadata("bindings", &[], r#"references = ["../../vendor/core"]"#)?;
  ws.add_crate("standalone", &[])?;
  Ok(())
}

/// Workspace with `vendor/core` as a submodule and a crate referencing it
fn workspace_with_submodule(upstream: &UpstreamRepo) -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  add_submodule(&ws, upstream)?;
  add_crates(&ws)?;
  ws.commit("Add submodule and crates")?;
  ws.tag_base()?;
  Ok(ws)
}

/// Files tracked at the upstream's HEAD, resolved under the submodule checkout
fn upstream_files(ws: &TestWorkspace, upstream: &UpstreamRepo) -> Result<Vec<PathBuf>> {
  let listed = git(&upstream.path, &["ls-tree", "-r", "--name-only", "HEAD"])?;
  Ok(
    String::from_utf8_lossy(&listed.stdout)
      .lines()
      .map(|file| ws.path.join("vendor/core").join(file))
      .collect(),
  )
}

#[test]
fn test_submodule_change_is_expanded() -> Result<()> {
  let upstream = UpstreamRepo::new(&[("src/parser.rs", "pub fn parse() {}\n")])?;
  let ws = workspace_with_submodule(&upstream)?;

  // Move the submodule pointer to a new commit
  let nested = ws.path.join("vendor/core");
  std::fs::write(nested.join("src/parser.rs"), "pub fn parse() -> bool { true }\n")?;
  commit_all(&nested, "Change parser")?;
  ws.commit("Bump vendor/core")?;

  let json = run_json(&ws.path, &[".", "base"])?;
  let changed = json_paths(&json, "/changed_paths");

  assert_eq!(changed, vec![nested.join("src/parser.rs")]);
  assert!(!changed.contains(&nested), "link marker must not be a changed path");
  assert_eq!(json_paths(&json, "/impact/affected"), vec![ws.manifest("bindings")]);

  Ok(())
}

#[test]
fn test_no_nested_flag_skips_expansion() -> Result<()> {
  let upstream = UpstreamRepo::new(&[("src/parser.rs", "pub fn parse() {}\n")])?;
  let ws = workspace_with_submodule(&upstream)?;

  let nested = ws.path.join("vendor/core");
  std::fs::write(nested.join("src/parser.rs"), "pub fn parse() -> u8 { 1 }\n")?;
  commit_all(&nested, "Change parser")?;
  ws.commit("Bump vendor/core")?;

  let output = run_cargo_impact(&ws.path, &[".", "base", "--no-nested"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert_eq!(stdout, "No changes detected since base\n");

  Ok(())
}

#[test]
fn test_unregistered_link_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", &[])?;
  let head = ws.commit("Add lib-a")?;
  ws.tag_base()?;

  // A gitlink with no .gitmodules entry
  let cacheinfo = format!("160000,{},vendor/ghost", head);
  git(&ws.path, &["update-index", "--add", "--cacheinfo", &cacheinfo])?;
  git(&ws.path, &["commit", "-m", "Add dangling gitlink"])?;

  let output = run_cargo_impact_raw(&ws.path, &[".", "base"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(String::from_utf8_lossy(&output.stderr).contains("vendor/ghost"));

  Ok(())
}

#[test]
fn test_removed_submodule_is_skipped() -> Result<()> {
  let upstream = UpstreamRepo::new(&[("src/parser.rs", "pub fn parse() {}\n")])?;
  let ws = workspace_with_submodule(&upstream)?;

  // Drops the gitlink and its .gitmodules entry in one commit
  git(&ws.path, &["rm", "-q", "vendor/core"])?;
  ws.commit("Remove vendor/core")?;

  let output = run_cargo_impact_raw(&ws.path, &[".", "base", "--format", "json"])?;
  assert_eq!(
    output.status.code(),
    Some(0),
    "stderr: {}",
    String::from_utf8_lossy(&output.stderr)
  );

  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let changed = json_paths(&json, "/changed_paths");
  assert_eq!(changed, vec![ws.path.join(".gitmodules")]);
  assert!(json_paths(&json, "/impact/affected").is_empty());

  Ok(())
}

#[test]
fn test_added_submodule_lists_its_tree() -> Result<()> {
  let upstream = UpstreamRepo::new(&[
    ("src/parser.rs", "pub fn parse() {}\n"),
    ("src/lexer.rs", "pub fn lex() {}\n"),
    ("README.md", "# core\n"),
  ])?;
  let ws = TestWorkspace::new()?;
  add_crates(&ws)?;
  ws.commit("Add crates")?;
  ws.tag_base()?;

  add_submodule(&ws, &upstream)?;
  ws.commit("Add vendor/core")?;

  let json = run_json(&ws.path, &[".", "base"])?;
  let changed = json_paths(&json, "/changed_paths");

  let files = upstream_files(&ws, &upstream)?;
  assert_eq!(files.len(), 3);
  for file in &files {
    assert!(changed.contains(file), "missing {} in {:?}", file.display(), changed);
  }
  assert!(changed.contains(&ws.path.join(".gitmodules")));
  assert!(!changed.contains(&ws.path.join("vendor/core")));
  assert_eq!(json_paths(&json, "/impact/affected"), vec![ws.manifest("bindings")]);

  Ok(())
}

#[test]
fn test_head_flag_reads_registry_at_revision() -> Result<()> {
  let upstream = UpstreamRepo::new(&[("src/parser.rs", "pub fn parse() {}\n")])?;
  let ws = TestWorkspace::new()?;
  add_crates(&ws)?;
  ws.commit("Add crates")?;
  ws.tag_base()?;

  add_submodule(&ws, &upstream)?;
  ws.commit("Add vendor/core")?;

  // The checkout goes back to a tree without .gitmodules; the submodule directory stays
  git(&ws.path, &["checkout", "-q", "base"])?;
  assert!(!ws.path.join(".gitmodules").exists());

  let json = run_json(&ws.path, &[".", "base", "--head", "main"])?;
  let changed = json_paths(&json, "/changed_paths");
  assert!(changed.contains(&ws.path.join("vendor/core/src/parser.rs")));
  assert_eq!(json_paths(&json, "/impact/affected"), vec![ws.manifest("bindings")]);

  Ok(())
}
