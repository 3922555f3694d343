//! Progress indicators for long-running operations
//!
//! Uses `linya`, which draws to stderr and is safe to tick from rayon workers

use linya::{Bar, Progress};
use std::sync::Mutex;

/// Per-project reference resolution progress.
/// Thread-safe: workers share one `&ResolutionProgress`.
pub struct ResolutionProgress {
  progress: Mutex<Progress>,
  bar: Bar,
}

impl ResolutionProgress {
  /// Create a bar for `total` projects
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Mutex::new(progress),
      bar,
    }
  }

  /// Increment progress by 1
  pub fn inc(&self) {
    // A poisoned bar only loses drawing; resolution carries on
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(&self.bar, 1);
    }
  }
}
