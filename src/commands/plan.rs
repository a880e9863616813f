//! `release-rail plan`: ordered stage list for the selected targets

use super::targets_or_default;
use crate::core::config::{CommitPlacement, TagPlacement};
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::pipeline::Stage;
use crate::pipeline::graph::execution_plan;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PlannedStage {
  stage: Stage,
  depends_on: Vec<Stage>,
  description: &'static str,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
  package: String,
  targets: Vec<Stage>,
  tag_at: TagPlacement,
  commit_at: CommitPlacement,
  stages: Vec<PlannedStage>,
}

/// Show what a run would execute, in order
pub fn run_plan(ctx: &ReleaseContext, targets: Vec<Stage>, json: bool) -> ReleaseResult<()> {
  let targets = targets_or_default(targets);
  let plan = execution_plan(&targets)?;
  let policy = ctx.config.policy;

  let output = PlanOutput {
    package: ctx.package().to_string(),
    targets,
    tag_at: policy.tag_at,
    commit_at: policy.commit_at,
    stages: plan
      .into_iter()
      .map(|stage: Stage| {
        let def = stage.definition();
        PlannedStage {
          stage: def.stage,
          depends_on: def.depends_on.to_vec(),
          description: def.description,
        }
      })
      .collect(),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&output)?);
    return Ok(());
  }

  println!("📋 Release plan for '{}'", output.package);
  println!();
  for (i, planned) in output.stages.iter().enumerate() {
    println!("  {}. {:<8} {}", i + 1, planned.stage.name(), planned.description);
    if !planned.depends_on.is_empty() {
      let deps: Vec<_> = planned.depends_on.iter().map(|s| s.name()).collect();
      println!("     after: {}", deps.join(", "));
    }
  }
  println!();
  println!(
    "  Tag created at: {}",
    match output.tag_at {
      TagPlacement::Compile => "Compile",
      TagPlacement::Pack => "Pack",
    }
  );
  println!(
    "  Version bump committed at: {}",
    match output.commit_at {
      CommitPlacement::Pack => "Pack",
      CommitPlacement::Push => "Push",
    }
  );

  Ok(())
}
