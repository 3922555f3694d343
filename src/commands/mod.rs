//! CLI commands for cargo-impact
//!
//! - **affected**: Find projects impacted by changes between two revisions

pub mod affected;

pub use affected::{ImpactOptions, run_affected};
