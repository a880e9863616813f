//! Progress indicator for pipeline runs
//!
//! Uses `linya` for an allocation-free progress bar drawn to stderr, so
//! stdout stays reserved for the run summary.

use crate::pipeline::{Stage, StageState};
use linya::{Bar, Progress};

/// One bar advancing as stages of the plan finish
pub struct StageProgress {
  progress: Progress,
  bar: Bar,
}

impl StageProgress {
  /// Bar over `total` planned stages
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Advance on every stage that finished successfully
  pub fn observe(&mut self, _stage: Stage, state: StageState) {
    if state == StageState::Succeeded {
      self.progress.inc_and_draw(&self.bar, 1);
    }
  }
}
