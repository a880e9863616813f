//! `release-rail run`: execute the pipeline against the real collaborators

use super::targets_or_default;
use crate::build::{BuildConfiguration, CommandBuildTool};
use crate::core::context::ReleaseContext;
use crate::core::credentials::LayeredCredentials;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::pipeline::graph::execution_plan;
use crate::pipeline::{Gateways, ReleasePipeline, RunReport, Stage, StageState};
use crate::registry::CommandRegistry;
use crate::ui::progress::StageProgress;

/// Run the release pipeline
pub fn run_release(
  ctx: &ReleaseContext,
  targets: Vec<Stage>,
  configuration: BuildConfiguration,
  json: bool,
) -> ReleaseResult<()> {
  let targets = targets_or_default(targets);
  let plan = execution_plan(&targets)?;
  let settings = ctx.settings(configuration);

  let gateways = Gateways {
    scm: Box::new(SystemGit::open(&ctx.root)?),
    build: Box::new(CommandBuildTool::new(ctx.config.commands.clone(), settings.clone())),
    registry: Box::new(CommandRegistry::new(
      ctx.config.commands.push.clone(),
      ctx.package(),
      &settings.package_dir,
    )),
    credentials: Box::new(LayeredCredentials::from_process_env(&ctx.config_path)),
  };
  let mut pipeline = ReleasePipeline::new(settings, ctx.version_store(), gateways);

  let result = if json {
    pipeline.run(&targets)
  } else {
    println!("🚂 Releasing '{}' ({})", ctx.package(), configuration);
    println!(
      "   Plan: {}",
      plan.iter().map(|s| s.name()).collect::<Vec<_>>().join(" → ")
    );
    println!();

    let mut progress = StageProgress::new(plan.len(), ctx.package().to_string());
    pipeline.run_with(&targets, &mut |stage, state| progress.observe(stage, state))
  };

  if let Some(report) = pipeline.last_report() {
    if json {
      println!("{}", serde_json::to_string_pretty(report)?);
    } else {
      print_summary(report);
    }
  }

  result.map(|_| ())
}

fn print_summary(report: &RunReport) {
  println!();
  match report.failed_stage {
    None => println!("✅ Release pipeline for '{}' succeeded", report.package),
    Some(stage) => println!("❌ Release pipeline for '{}' failed at {}", report.package, stage),
  }
  println!();

  if let Some(version) = report.version {
    println!("  Version:  {}", version);
  }
  if let Some(tag) = &report.tag {
    println!("  Tag:      {}", tag);
  }
  if let Some(artifact) = &report.artifact {
    println!("  Artifact: {}", artifact.display());
  }
  if let Some(digest) = &report.artifact_sha256 {
    println!("  SHA-256:  {}", digest);
  }
  if report.version_committed {
    println!("  Version record committed");
  }

  println!();
  println!("  Stages:");
  for record in &report.stages {
    let icon = match record.state {
      StageState::Succeeded => "✅",
      StageState::Failed => "❌",
      StageState::Running => "⏳",
      StageState::Pending => "⏸️ ",
    };
    match record.duration_ms {
      Some(ms) => println!("    {} {:<8} {}ms", icon, record.stage.name(), ms),
      None => println!("    {} {:<8} not run", icon, record.stage.name()),
    }
  }
  println!();
  println!("  Finished in {}ms", report.duration_ms);
}
