//! Release stages and the explicit stage table
//!
//! Each row names a stage's prerequisites, its ordering constraints, and the
//! precondition / action / postcondition / finalize steps run for it. The
//! `finalize` step only runs after the postcondition held, which is where the
//! version-mutating steps that depend on a produced artifact live.

use super::actions::{self, StageContext};
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named step of the release pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Clean,
  Restore,
  Compile,
  Test,
  Pack,
  Push,
}

impl Stage {
  /// All stages in canonical order
  pub const ALL: [Stage; 6] = [
    Stage::Clean,
    Stage::Restore,
    Stage::Compile,
    Stage::Test,
    Stage::Pack,
    Stage::Push,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Stage::Clean => "Clean",
      Stage::Restore => "Restore",
      Stage::Compile => "Compile",
      Stage::Test => "Test",
      Stage::Pack => "Pack",
      Stage::Push => "Push",
    }
  }

  pub(crate) fn index(self) -> usize {
    self as usize
  }

  /// This stage's row in the stage table
  pub fn definition(self) -> &'static StageDef {
    &STAGES[self.index()]
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Stage {
  type Err = ReleaseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Stage::ALL
      .into_iter()
      .find(|stage| stage.name().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| ConfigError::UnknownStage { name: s.to_string() }.into())
  }
}

/// Lifecycle of a stage within one pipeline invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
  Pending,
  Running,
  Succeeded,
  Failed,
}

pub type Check = fn(&StageContext<'_>) -> ReleaseResult<()>;
pub type Action = fn(&mut StageContext<'_>) -> ReleaseResult<()>;

/// A row of the stage table
pub struct StageDef {
  pub stage: Stage,
  /// Stages that must have succeeded before this one may run
  pub depends_on: &'static [Stage],
  /// Stages this one must precede when both are selected (not a dependency)
  pub runs_before: &'static [Stage],
  pub description: &'static str,
  /// Checked before the first stage of any plan containing this one
  pub requires_clean_working_copy: bool,
  pub precondition: Option<Check>,
  pub action: Action,
  pub postcondition: Option<Check>,
  pub finalize: Option<Action>,
}

/// The release stage graph
pub static STAGES: [StageDef; 6] = [
  StageDef {
    stage: Stage::Clean,
    depends_on: &[],
    runs_before: &[Stage::Restore],
    description: "empty the output directory",
    requires_clean_working_copy: false,
    precondition: None,
    action: actions::clean,
    postcondition: Some(actions::output_dir_is_empty),
    finalize: None,
  },
  StageDef {
    stage: Stage::Restore,
    depends_on: &[],
    runs_before: &[],
    description: "resolve dependencies",
    requires_clean_working_copy: false,
    precondition: None,
    action: actions::restore,
    postcondition: None,
    finalize: None,
  },
  StageDef {
    stage: Stage::Compile,
    depends_on: &[Stage::Restore],
    runs_before: &[],
    description: "compute the next version, tag it (tag_at = compile), build stamped binaries",
    requires_clean_working_copy: false,
    precondition: None,
    action: actions::compile,
    postcondition: None,
    finalize: None,
  },
  StageDef {
    stage: Stage::Test,
    depends_on: &[Stage::Compile],
    runs_before: &[],
    description: "run the test suite",
    requires_clean_working_copy: false,
    precondition: None,
    action: actions::test,
    postcondition: None,
    finalize: None,
  },
  StageDef {
    stage: Stage::Pack,
    depends_on: &[Stage::Compile, Stage::Test],
    runs_before: &[],
    description: "produce the artifact, then tag (tag_at = pack) and commit the version bump (commit_at = pack)",
    requires_clean_working_copy: true,
    precondition: Some(actions::working_copy_is_clean),
    action: actions::pack,
    postcondition: Some(actions::artifact_exists),
    finalize: Some(actions::finalize_pack),
  },
  StageDef {
    stage: Stage::Push,
    depends_on: &[Stage::Pack],
    runs_before: &[],
    description: "publish the artifact, then commit the version bump (commit_at = push)",
    requires_clean_working_copy: false,
    precondition: Some(actions::artifact_exists),
    action: actions::push,
    postcondition: None,
    finalize: Some(actions::finalize_push),
  },
];
