//! Integration tests for cargo-impact
//!
//! Each test builds a real git repository (and Cargo workspace) in a temp
//! directory and runs the compiled binary against it.

mod helpers;
mod test_nested;
