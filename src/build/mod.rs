//! Build tool boundary: restore, compile, test, pack
//!
//! The pipeline only sees the [`BuildTool`] trait. [`CommandBuildTool`] drives
//! the external commands configured under `[commands]` in release.toml.

mod command;

pub use command::CommandBuildTool;

use crate::core::error::ReleaseResult;
use crate::release::Version;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Named build configuration, chosen once when the pipeline is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildConfiguration {
  Debug,
  Release,
}

impl BuildConfiguration {
  /// Display name passed as `{configuration}`
  pub fn name(self) -> &'static str {
    match self {
      BuildConfiguration::Debug => "Debug",
      BuildConfiguration::Release => "Release",
    }
  }

  /// Cargo profile name passed as `{profile}`
  pub fn profile(self) -> &'static str {
    match self {
      BuildConfiguration::Debug => "dev",
      BuildConfiguration::Release => "release",
    }
  }

  /// Output directory name under target/, passed as `{profile_dir}`
  pub fn profile_dir(self) -> &'static str {
    match self {
      BuildConfiguration::Debug => "debug",
      BuildConfiguration::Release => "release",
    }
  }
}

impl fmt::Display for BuildConfiguration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Operations delegated to the package's build tool
pub trait BuildTool {
  /// Fetch and resolve dependencies
  fn restore(&self) -> ReleaseResult<()>;

  /// Build binaries stamped with `version`
  fn compile(&self, version: Version) -> ReleaseResult<()>;

  /// Run the test suite against the compiled output
  fn test(&self) -> ReleaseResult<()>;

  /// Produce the package artifact for `version` in `output_dir`, returning its path
  fn pack(&self, version: Version, output_dir: &Path) -> ReleaseResult<PathBuf>;
}
