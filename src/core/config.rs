use crate::core::error::{ConfigError, ImpactError, ImpactResult, ResultExt};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for cargo-impact
/// Searched in order: impact.toml, .impact.toml, .cargo/impact.toml, .config/impact.toml
///
/// Every section is optional; a workspace without a config file runs with defaults.
///
/// ```toml
/// [diff]
/// head = "HEAD"
/// nested = true
///
/// [graph]
/// jobs = 8
/// track_sources = true
/// global_imports = ["rust-toolchain.toml", ".cargo/config.toml"]
///
/// [output]
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImpactConfig {
  #[serde(default)]
  pub diff: DiffConfig,
  #[serde(default)]
  pub graph: GraphConfig,
  #[serde(default)]
  pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiffConfig {
  /// Revision the base is compared against (default: HEAD)
  #[serde(default = "default_head")]
  pub head: String,

  /// Expand submodule links into their own diffs (default: true)
  #[serde(default = "default_true")]
  pub nested: bool,
}

fn default_head() -> String {
  "HEAD".to_string()
}

fn default_true() -> bool {
  true
}

impl Default for DiffConfig {
  fn default() -> Self {
    Self {
      head: default_head(),
      nested: true,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
  /// Worker threads for reference resolution (default: rayon's choice)
  #[serde(default)]
  pub jobs: Option<usize>,

  /// Treat target sources (src/, build.rs, README, license) as references
  #[serde(default = "default_true")]
  pub track_sources: bool,

  /// Files every project imports, relative to the workspace root
  #[serde(default)]
  pub global_imports: Vec<PathBuf>,
}

impl Default for GraphConfig {
  fn default() -> Self {
    Self {
      jobs: None,
      track_sources: true,
      global_imports: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
  /// Output format: text, json, names, dot
  #[serde(default)]
  pub format: Option<String>,
}

impl GraphConfig {
  fn validate(&self) -> ImpactResult<()> {
    if self.jobs == Some(0) {
      return Err(ImpactError::Config(ConfigError::InvalidValue {
        field: "graph.jobs".to_string(),
        value: "0".to_string(),
      }));
    }
    Ok(())
  }
}

impl ImpactConfig {
  /// Find config file in search order: impact.toml, .impact.toml, .cargo/impact.toml, .config/impact.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("impact.toml"),
      path.join(".impact.toml"),
      path.join(".cargo").join("impact.toml"),
      path.join(".config").join("impact.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from impact.toml, falling back to defaults when none exists
  pub fn load(path: &Path) -> ImpactResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      tracing::debug!(root = %path.display(), "no impact.toml found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ImpactConfig = toml_edit::de::from_str(&content).map_err(|e| {
      ImpactError::Config(ConfigError::Invalid {
        path: config_path.clone(),
        reason: e.to_string(),
      })
    })?;

    config.graph.validate()?;

    tracing::debug!(path = %config_path.display(), "loaded configuration");
    Ok(config)
  }
}
