//! Build tool driven by configured command templates

use super::BuildTool;
use crate::core::config::{CommandsConfig, ReleaseSettings};
use crate::core::error::{BuildError, ReleaseError, ReleaseResult};
use crate::core::process::{CommandOutcome, run_command};
use crate::release::Version;
use crate::utils::{TemplateVars, expand_template};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Runs restore/compile/test/pack as external commands in the package directory
///
/// Every command also receives `RELEASE_PACKAGE`, `RELEASE_CONFIGURATION` and,
/// once known, `RELEASE_VERSION` in its environment so build scripts can stamp
/// the version into binaries.
pub struct CommandBuildTool {
  commands: CommandsConfig,
  settings: ReleaseSettings,
}

impl CommandBuildTool {
  pub fn new(commands: CommandsConfig, settings: ReleaseSettings) -> Self {
    Self { commands, settings }
  }

  fn vars(&self, version: Option<Version>, output_dir: &Path) -> TemplateVars {
    let mut vars = TemplateVars::new();
    vars.insert("package", self.settings.package.clone());
    vars.insert("configuration", self.settings.configuration.name().to_string());
    vars.insert("profile", self.settings.configuration.profile().to_string());
    vars.insert("profile_dir", self.settings.configuration.profile_dir().to_string());
    vars.insert("package_dir", self.settings.package_dir.display().to_string());
    vars.insert("output_dir", output_dir.display().to_string());
    vars.insert("bin_dir", self.settings.bin_dir.display().to_string());
    if let Some(version) = version {
      vars.insert("version", version.to_string());
    }
    vars
  }

  fn env(&self, version: Option<Version>) -> Vec<(&'static str, String)> {
    let mut env = vec![
      ("RELEASE_PACKAGE", self.settings.package.clone()),
      ("RELEASE_CONFIGURATION", self.settings.configuration.name().to_string()),
    ];
    if let Some(version) = version {
      env.push(("RELEASE_VERSION", version.to_string()));
    }
    env
  }

  /// Run one template; spawn failures and non-zero exits both go through `on_failure`
  fn execute(
    &self,
    template: &[String],
    vars: &TemplateVars,
    version: Option<Version>,
    on_failure: impl FnOnce(String) -> BuildError,
  ) -> ReleaseResult<CommandOutcome> {
    let argv = expand_template(template, vars);
    let outcome = match run_command(&argv, &self.settings.package_dir, &self.env(version), &[]) {
      Ok(outcome) => outcome,
      Err(e) => {
        return Err(ReleaseError::Build(on_failure(format!(
          "failed to launch `{}`: {}",
          argv.join(" "),
          e
        ))));
      }
    };

    if !outcome.success {
      return Err(ReleaseError::Build(on_failure(outcome.detail())));
    }

    Ok(outcome)
  }
}

impl BuildTool for CommandBuildTool {
  fn restore(&self) -> ReleaseResult<()> {
    let vars = self.vars(None, &self.settings.output_dir);
    self.execute(&self.commands.restore, &vars, None, |detail| {
      BuildError::DependencyResolutionFailed { detail }
    })?;
    Ok(())
  }

  fn compile(&self, version: Version) -> ReleaseResult<()> {
    let vars = self.vars(Some(version), &self.settings.output_dir);
    let outcome = self.execute(&self.commands.compile, &vars, Some(version), |detail| {
      BuildError::CompileFailed {
        version: version.to_string(),
        detail,
      }
    })?;
    info!(%version, configuration = %self.settings.configuration, duration_ms = outcome.duration_ms, "Compiled");
    Ok(())
  }

  fn test(&self) -> ReleaseResult<()> {
    let vars = self.vars(None, &self.settings.output_dir);
    let outcome = self.execute(&self.commands.test, &vars, None, |detail| BuildError::TestsFailed { detail })?;
    info!(duration_ms = outcome.duration_ms, "Tests passed");
    Ok(())
  }

  fn pack(&self, version: Version, output_dir: &Path) -> ReleaseResult<PathBuf> {
    let artifact = output_dir.join(format!(
      "{}-{}.{}",
      self.settings.package, version, self.settings.artifact_extension
    ));
    let mut vars = self.vars(Some(version), output_dir);
    vars.insert("artifact", artifact.display().to_string());

    // A failing pack command leaves no artifact behind as far as the pipeline is concerned
    self.execute(&self.commands.pack, &vars, Some(version), |detail| {
      warn!(%detail, "Pack command failed");
      BuildError::ArtifactNotProduced { path: artifact.clone() }
    })?;

    Ok(artifact)
  }
}
