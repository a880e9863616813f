//! CLI commands for release-rail
//!
//! - **run**: Execute the release pipeline up to the selected target stages
//! - **plan**: Show the ordered stages a run would execute, without side effects
//! - **version**: Inspect the version record (current and next version)
//!
//! All commands accept `&ReleaseContext` so release.toml is loaded once.

pub mod plan;
pub mod run;
pub mod version;

pub use plan::run_plan;
pub use run::run_release;
pub use version::{run_version_next, run_version_show};

use crate::pipeline::Stage;

/// Stage a run ends at when no target is given
pub const DEFAULT_TARGET: Stage = Stage::Pack;

/// Selected targets, falling back to [`DEFAULT_TARGET`]
pub(crate) fn targets_or_default(targets: Vec<Stage>) -> Vec<Stage> {
  if targets.is_empty() { vec![DEFAULT_TARGET] } else { targets }
}
