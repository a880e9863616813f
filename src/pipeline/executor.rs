//! Release pipeline state machine
//!
//! Runs the stages of an execution plan one at a time. A stage goes
//! `Pending -> Running -> Succeeded | Failed`; the first failure stops the run
//! and every later stage stays `Pending`. A plan that ends in a stage needing a
//! clean working copy is refused before its first stage runs, so a dirty tree
//! never leaves a tag or a build behind.

use super::actions::{self, Gateways, StageContext};
use super::graph;
use super::stage::{Stage, StageDef, StageState};
use crate::build::BuildConfiguration;
use crate::core::config::ReleaseSettings;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::release::{Version, VersionStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Outcome of one stage in a run
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
  pub stage: Stage,
  pub state: StageState,
  pub duration_ms: Option<u64>,
}

/// Summary of one pipeline invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub package: String,
  pub configuration: BuildConfiguration,
  pub targets: Vec<Stage>,
  pub plan: Vec<Stage>,
  pub version: Option<Version>,
  pub tag: Option<String>,
  pub artifact: Option<PathBuf>,
  pub artifact_sha256: Option<String>,
  pub version_committed: bool,
  pub stages: Vec<StageRecord>,
  pub started_at: DateTime<Utc>,
  pub duration_ms: u64,
  pub success: bool,
  pub failed_stage: Option<Stage>,
  pub error: Option<String>,
}

/// Sequential executor over the stage table
pub struct ReleasePipeline {
  settings: ReleaseSettings,
  store: VersionStore,
  gateways: Gateways,
  states: [StageState; 6],
  durations: [Option<u64>; 6],
  last_report: Option<RunReport>,
}

impl ReleasePipeline {
  pub fn new(settings: ReleaseSettings, store: VersionStore, gateways: Gateways) -> Self {
    Self {
      settings,
      store,
      gateways,
      states: [StageState::Pending; 6],
      durations: [None; 6],
      last_report: None,
    }
  }

  #[cfg(test)]
  fn state(&self, stage: Stage) -> StageState {
    self.states[stage.index()]
  }

  /// Report of the last run, failed or not
  pub fn last_report(&self) -> Option<&RunReport> {
    self.last_report.as_ref()
  }

  /// Run `targets` and their prerequisites
  pub fn run(&mut self, targets: &[Stage]) -> ReleaseResult<RunReport> {
    self.run_with(targets, &mut |_, _| {})
  }

  /// Run `targets`, reporting every state transition to `observer`
  ///
  /// On failure the error is `PipelineFailed { stage, cause }`; the report of
  /// the failed run stays available through [`ReleasePipeline::last_report`].
  pub fn run_with(
    &mut self,
    targets: &[Stage],
    observer: &mut dyn FnMut(Stage, StageState),
  ) -> ReleaseResult<RunReport> {
    let plan = graph::execution_plan(targets)?;
    let started_at = Utc::now();
    let start = Instant::now();

    self.states = [StageState::Pending; 6];
    self.durations = [None; 6];

    let Self {
      settings,
      store,
      gateways,
      states,
      durations,
      last_report,
    } = self;

    info!(
      package = %settings.package,
      configuration = %settings.configuration,
      plan = ?plan,
      "Starting release pipeline"
    );

    let mut ctx = StageContext::new(settings, store, gateways);
    let mut failure: Option<ReleaseError> = None;

    let gated = plan
      .iter()
      .copied()
      .find(|stage| stage.definition().requires_clean_working_copy);
    if let Some(stage) = gated {
      if let Err(cause) = actions::working_copy_is_clean(&ctx) {
        states[stage.index()] = StageState::Failed;
        observer(stage, StageState::Failed);
        error!(stage = %stage, state = "failed", error = %cause, "Working copy check failed before the first stage");
        failure = Some(ReleaseError::stage_failed(stage, cause));
      }
    }

    for &stage in plan.iter().take_while(|_| failure.is_none()) {
      let def = stage.definition();

      if let Some(dep) = def
        .depends_on
        .iter()
        .find(|dep| states[dep.index()] != StageState::Succeeded)
      {
        let cause = ReleaseError::message(format!("Prerequisite '{}' has not succeeded", dep));
        states[stage.index()] = StageState::Failed;
        observer(stage, StageState::Failed);
        failure = Some(ReleaseError::stage_failed(stage, cause));
        break;
      }

      states[stage.index()] = StageState::Running;
      observer(stage, StageState::Running);
      info!(stage = %stage, state = "running", "{}", def.description);

      let stage_start = Instant::now();
      let result = run_stage(def, &mut ctx);
      let elapsed = stage_start.elapsed().as_millis() as u64;
      durations[stage.index()] = Some(elapsed);

      match result {
        Ok(()) => {
          states[stage.index()] = StageState::Succeeded;
          observer(stage, StageState::Succeeded);
          info!(stage = %stage, state = "succeeded", duration_ms = elapsed, "Stage finished");
        }
        Err(cause) => {
          states[stage.index()] = StageState::Failed;
          observer(stage, StageState::Failed);
          error!(stage = %stage, state = "failed", error = %cause, "Stage failed");
          failure = Some(ReleaseError::stage_failed(stage, cause));
          break;
        }
      }
    }

    let report = RunReport {
      package: ctx.settings.package.clone(),
      configuration: ctx.settings.configuration,
      targets: targets.to_vec(),
      stages: plan
        .iter()
        .map(|&stage| StageRecord {
          stage,
          state: states[stage.index()],
          duration_ms: durations[stage.index()],
        })
        .collect(),
      plan,
      version: ctx.next_version,
      tag: ctx.tag.clone(),
      artifact: ctx.artifact.clone(),
      artifact_sha256: ctx.artifact_sha256.clone(),
      version_committed: ctx.version_committed,
      started_at,
      duration_ms: start.elapsed().as_millis() as u64,
      success: failure.is_none(),
      failed_stage: match &failure {
        Some(ReleaseError::PipelineFailed { stage, .. }) => Some(*stage),
        _ => None,
      },
      error: failure.as_ref().map(|e| e.root_cause().to_string()),
    };
    *last_report = Some(report.clone());

    match failure {
      Some(err) => Err(err),
      None => Ok(report),
    }
  }
}

fn run_stage(def: &StageDef, ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  if let Some(check) = def.precondition {
    check(ctx)?;
  }
  (def.action)(ctx)?;
  if let Some(check) = def.postcondition {
    check(ctx)?;
  }
  if let Some(finalize) = def.finalize {
    finalize(ctx)?;
  }
  Ok(())
}
