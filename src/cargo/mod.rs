//! Cargo workspace integration
//!
//! This module provides utilities for reading Cargo workspaces:
//!
//! - **metadata**: Load workspace members using cargo_metadata
//! - **manifest**: Inspect individual Cargo.toml files with toml_edit (workspace inheritance)

pub mod manifest;
pub mod metadata;
