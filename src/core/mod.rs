//! Core building blocks for cargo-impact
//!
//! - **config**: impact.toml parsing and validation
//! - **error**: Error types with contextual help messages and exit codes
//! - **vcs**: Git operations abstraction (SystemGit)

pub mod config;
pub mod error;
pub mod vcs;
