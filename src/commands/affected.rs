//! `cargo impact` - Show which projects are impacted by changes
//!
//! This command:
//! - Diffs the repository (and one level of submodules) from `base` to `head`
//! - Builds the reverse dependency map of the Cargo workspace
//! - Resolves the affected projects by worklist closure
//!
//! The diff runs first: when nothing changed, the workspace is never parsed.

use crate::adapters::cargo::{CargoOptions, CargoWorkspace};
use crate::adapters::{Workspace, WorkspaceProvider};
use crate::core::config::ImpactConfig;
use crate::core::error::{ImpactError, ImpactResult, ResultExt};
use crate::core::vcs::VersionControlProvider;
use crate::core::vcs::system_git::SystemGitProvider;
use crate::graph::diff::{changed_paths, is_unchanged};
use crate::graph::{
  DependencyGraphBuilder, DiffAggregator, ImpactAnalysis, ImpactOutcome, ImpactResolver, ReverseDependencyMap,
};
use crate::ui::progress::ResolutionProgress;
use crate::utils::display_relative;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Output format for the impact command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
  Text,
  Json,
  Names,
  Dot,
}

impl OutputFormat {
  fn from_str(s: &str) -> ImpactResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::Names),
      "dot" => Ok(Self::Dot),
      _ => Err(ImpactError::with_help(
        format!("Unknown format '{}'", s),
        "Valid formats: text, json, names, dot",
      )),
    }
  }
}

/// Command-line options, before merging with impact.toml
#[derive(Debug, Clone, Default)]
pub struct ImpactOptions {
  /// Workspace directory or its Cargo.toml
  pub workspace: PathBuf,
  pub base: String,
  pub head: Option<String>,
  pub format: Option<String>,
  pub no_nested: bool,
  pub progress: bool,
  pub jobs: Option<usize>,
}

/// Settings after CLI flags override config values
#[derive(Debug, Clone)]
struct ImpactSettings {
  base: String,
  head: String,
  nested: bool,
  progress: bool,
}

/// Everything one run produced. `graph` is `None` on the fast path.
struct ImpactRun {
  outcome: ImpactOutcome,
  graph: Option<(Workspace, ReverseDependencyMap)>,
}

/// Run the impact command
pub fn run_affected(options: ImpactOptions) -> ImpactResult<()> {
  let descriptor_path = workspace_descriptor(&options.workspace)?;
  let workspace_dir = descriptor_path.parent().unwrap_or(Path::new(".")).to_path_buf();
  let config = ImpactConfig::load(&workspace_dir)?;

  let format = OutputFormat::from_str(
    options
      .format
      .as_deref()
      .or(config.output.format.as_deref())
      .unwrap_or("text"),
  )?;

  if let Some(jobs) = options.jobs.or(config.graph.jobs) {
    if jobs == 0 {
      return Err(ImpactError::with_help("--jobs must be at least 1", "Omit --jobs to use all cores"));
    }
    rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global()?;
    tracing::debug!(jobs, "configured worker pool");
  }

  let settings = ImpactSettings {
    base: options.base,
    head: options.head.unwrap_or_else(|| config.diff.head.clone()),
    nested: config.diff.nested && !options.no_nested,
    progress: options.progress,
  };

  let provider = CargoWorkspace::new(CargoOptions {
    track_sources: config.graph.track_sources,
    global_imports: config.graph.global_imports.clone(),
  });

  let run = compute_impact(&SystemGitProvider, &provider, &descriptor_path, &settings)?;
  display_results(&run, &settings, format)
}

/// Accept either a workspace directory or a path to its Cargo.toml
fn workspace_descriptor(path: &Path) -> ImpactResult<PathBuf> {
  let descriptor = if path.is_dir() {
    path.join("Cargo.toml")
  } else {
    path.to_path_buf()
  };

  if !descriptor.is_file() {
    return Err(ImpactError::with_help(
      format!("No Cargo.toml found at {}", descriptor.display()),
      "Pass the workspace directory or its Cargo.toml",
    ));
  }

  descriptor
    .canonicalize()
    .with_context(|| format!("Failed to resolve {}", descriptor.display()))
}

/// Diff, then (unless nothing changed) build the reverse map and resolve
fn compute_impact(
  vcs: &dyn VersionControlProvider,
  provider: &dyn WorkspaceProvider,
  descriptor_path: &Path,
  settings: &ImpactSettings,
) -> ImpactResult<ImpactRun> {
  let workspace_dir = descriptor_path.parent().unwrap_or(Path::new("."));
  let repository_root = vcs.repository_root(workspace_dir)?;

  let diffs = DiffAggregator::new(vcs)
    .expand_nested(settings.nested)
    .aggregate(&repository_root, &settings.base, &settings.head)?;

  if is_unchanged(&diffs) {
    tracing::debug!(base = %settings.base, head = %settings.head, "no changes, skipping graph build");
    return Ok(ImpactRun {
      outcome: ImpactOutcome::NoChanges,
      graph: None,
    });
  }

  let changed = changed_paths(&diffs);
  tracing::debug!(repositories = diffs.len(), paths = changed.len(), "aggregated changes");

  let workspace = provider.parse_workspace(descriptor_path)?;

  let progress = settings
    .progress
    .then(|| ResolutionProgress::new(workspace.projects.len(), "Resolving references"));
  let mut builder = DependencyGraphBuilder::new(&workspace);
  if let Some(progress) = &progress {
    builder = builder.with_progress(progress);
  }
  let map = builder.build();

  let analysis = ImpactResolver::new(&workspace, &map).resolve(&changed);

  Ok(ImpactRun {
    outcome: ImpactOutcome::Analyzed(analysis),
    graph: Some((workspace, map)),
  })
}

/// Display impact results
fn display_results(run: &ImpactRun, settings: &ImpactSettings, format: OutputFormat) -> ImpactResult<()> {
  match format {
    OutputFormat::Text => {
      print!("{}", render_text(run, settings));
      Ok(())
    }
    OutputFormat::Json => {
      println!("{}", serde_json::to_string_pretty(&render_json(run, settings))?);
      Ok(())
    }
    OutputFormat::Names => {
      if let Some(analysis) = run.outcome.analysis() {
        for descriptor in &analysis.affected {
          println!("{}", descriptor.display());
        }
      }
      Ok(())
    }
    OutputFormat::Dot => {
      let dot = match (&run.outcome, &run.graph) {
        (ImpactOutcome::Analyzed(analysis), Some((workspace, map))) => map.to_dot(workspace, &analysis.affected),
        _ => "digraph {\n}\n".to_string(),
      };
      print!("{}", dot);
      Ok(())
    }
  }
}

/// Human-readable report
fn render_text(run: &ImpactRun, settings: &ImpactSettings) -> String {
  let (analysis, workspace) = match (&run.outcome, &run.graph) {
    (ImpactOutcome::Analyzed(analysis), Some((workspace, _))) => (analysis, workspace),
    _ => return format!("No changes detected since {}\n", settings.base),
  };

  let root = &workspace.root;
  let mut out = String::new();
  out.push_str("Impact Analysis\n");
  out.push_str("===============\n\n");
  out.push_str(&format!("Workspace: {}\n", workspace.descriptor_path.display()));
  out.push_str(&format!("Range: {}..{}\n\n", settings.base, settings.head));

  out.push_str(&format!("Changed paths: {}\n", analysis.changed_paths.len()));
  if analysis.changed_paths.len() <= 20 {
    for path in &analysis.changed_paths {
      out.push_str(&format!("  {}\n", display_relative(path, root)));
    }
  }
  out.push('\n');

  let sections = [
    ("Direct impact", &analysis.direct),
    ("Transitive dependents", &analysis.dependents),
    ("Affected (direct + dependents)", &analysis.affected),
  ];
  for (title, set) in sections {
    out.push_str(&format!("{}: {} projects\n", title, set.len()));
    for descriptor in set {
      out.push_str(&format!("  {}\n", project_label(workspace, descriptor)));
    }
    out.push('\n');
  }

  if !analysis.unclaimed.is_empty() {
    out.push_str(&format!("Unclaimed paths: {}\n", analysis.unclaimed.len()));
    for path in &analysis.unclaimed {
      out.push_str(&format!("  {}\n", display_relative(path, root)));
    }
  }

  out
}

fn project_label(workspace: &Workspace, descriptor: &Path) -> String {
  let rel = display_relative(descriptor, &workspace.root);
  match workspace.project(descriptor) {
    Some(project) => format!("{} ({})", project.name, rel),
    None => rel,
  }
}

/// Machine-readable report
fn render_json(run: &ImpactRun, settings: &ImpactSettings) -> serde_json::Value {
  use serde_json::json;

  let empty = ImpactAnalysis::default();
  let analysis = run.outcome.analysis().unwrap_or(&empty);

  let list = |set: &BTreeSet<PathBuf>| -> Vec<String> { set.iter().map(|p| p.display().to_string()).collect() };

  json!({
      "no_changes": run.outcome.is_no_changes(),
      "base": settings.base,
      "head": settings.head,
      "generated_at": chrono::Utc::now().to_rfc3339(),
      "changed_paths": list(&analysis.changed_paths),
      "impact": {
          "direct": list(&analysis.direct),
          "dependents": list(&analysis.dependents),
          "affected": list(&analysis.affected),
          "unclaimed": list(&analysis.unclaimed)
      },
      "summary": {
          "changed_paths_count": analysis.changed_paths.len(),
          "direct_count": analysis.direct.len(),
          "dependents_count": analysis.dependents.len(),
          "affected_count": analysis.affected.len(),
          "unclaimed_count": analysis.unclaimed.len()
      }
  })
}
