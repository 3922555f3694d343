//! Change-impact engine
//!
//! Three stages, each usable on its own:
//! - `diff`: changed paths across the root repository and its submodules
//! - `reverse_map`: referenced item → dependent projects
//! - `affected`: worklist closure over the reverse map

pub mod affected;
pub mod diff;
pub mod reverse_map;

pub use affected::{ImpactAnalysis, ImpactOutcome, ImpactResolver};
pub use diff::DiffAggregator;
pub use reverse_map::{DependencyGraphBuilder, ReverseDependencyMap};
