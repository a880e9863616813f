//! Release context, built once in main.rs and passed to every command
//!
//! Holds the configuration root and the parsed release.toml so commands never
//! re-discover or re-parse it.

use crate::build::BuildConfiguration;
use crate::core::config::{ReleaseConfig, ReleaseSettings};
use crate::core::error::ReleaseResult;
use crate::release::VersionStore;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ReleaseContext {
  /// Directory the configuration was discovered from (absolute path)
  pub root: PathBuf,

  /// The release.toml that was loaded
  pub config_path: PathBuf,

  pub config: ReleaseConfig,
}

impl ReleaseContext {
  /// Discover and load release.toml under `root`
  pub fn build(root: &Path) -> ReleaseResult<Self> {
    let (config, config_path) = ReleaseConfig::load(root)?;
    Ok(Self {
      root: root.to_path_buf(),
      config_path,
      config,
    })
  }

  pub fn package(&self) -> &str {
    &self.config.package.name
  }

  pub fn package_dir(&self) -> PathBuf {
    self.config.package_dir(&self.root)
  }

  /// Version record of the configured package
  pub fn version_store(&self) -> VersionStore {
    VersionStore::new(&self.package_dir(), self.package())
  }

  /// Resolved settings for a run in `configuration`
  pub fn settings(&self, configuration: BuildConfiguration) -> ReleaseSettings {
    ReleaseSettings::resolve(&self.root, &self.config, configuration)
  }
}
