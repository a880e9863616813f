use crate::build::BuildConfiguration;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for release-rail
/// Searched in order: release.toml, .release.toml, .config/release.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
  pub package: PackageConfig,
  #[serde(default)]
  pub output: OutputConfig,
  #[serde(default)]
  pub policy: PolicyConfig,
  #[serde(default)]
  pub commands: CommandsConfig,
}

/// The one package this pipeline releases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Package identifier; used for the version record, tags and artifact names
  pub name: String,

  /// Package directory, relative to the configuration root (default: ".")
  #[serde(default = "default_package_dir")]
  pub dir: PathBuf,
}

fn default_package_dir() -> PathBuf {
  PathBuf::from(".")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
  /// Directory the Clean stage empties and the Pack stage writes into
  #[serde(default = "default_output_dir")]
  pub dir: PathBuf,

  /// Artifact file extension (default: "tar.gz")
  #[serde(default = "default_artifact_extension")]
  pub artifact_extension: String,

  /// Compiled output directory, relative to the package (default: "target/{profile_dir}")
  #[serde(default = "default_bin_dir")]
  pub bin_dir: String,
}

fn default_output_dir() -> PathBuf {
  PathBuf::from("output")
}

fn default_artifact_extension() -> String {
  "tar.gz".to_string()
}

fn default_bin_dir() -> String {
  "target/{profile_dir}".to_string()
}

impl Default for OutputConfig {
  fn default() -> Self {
    Self {
      dir: default_output_dir(),
      artifact_extension: default_artifact_extension(),
      bin_dir: default_bin_dir(),
    }
  }
}

/// Where the tag is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagPlacement {
  /// Tag the next version right before compiling it
  #[default]
  Compile,
  /// Tag only after the artifact has been produced
  Pack,
}

/// Where the version bump is persisted and committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommitPlacement {
  /// After the Pack artifact postcondition holds
  #[default]
  Pack,
  /// After the registry acknowledged the upload
  Push,
}

/// Operator policy for the version-mutating steps
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PolicyConfig {
  #[serde(default)]
  pub tag_at: TagPlacement,
  #[serde(default)]
  pub commit_at: CommitPlacement,
}

/// External command templates (argv, first element is the program)
///
/// Placeholders: `{package}`, `{version}`, `{configuration}`, `{profile}`,
/// `{profile_dir}`, `{package_dir}`, `{output_dir}`, `{bin_dir}`, `{artifact}`,
/// `{api_key}`, `{source}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
  #[serde(default = "default_restore")]
  pub restore: Vec<String>,
  #[serde(default = "default_compile")]
  pub compile: Vec<String>,
  #[serde(default = "default_test")]
  pub test: Vec<String>,
  #[serde(default = "default_pack")]
  pub pack: Vec<String>,
  #[serde(default = "default_push")]
  pub push: Vec<String>,
}

fn argv(args: &[&str]) -> Vec<String> {
  args.iter().map(|s| s.to_string()).collect()
}

fn default_restore() -> Vec<String> {
  argv(&["cargo", "fetch"])
}

fn default_compile() -> Vec<String> {
  argv(&["cargo", "build", "--profile", "{profile}"])
}

fn default_test() -> Vec<String> {
  argv(&["cargo", "test", "--profile", "{profile}"])
}

fn default_pack() -> Vec<String> {
  argv(&["tar", "-czf", "{artifact}", "-C", "{bin_dir}", "."])
}

fn default_push() -> Vec<String> {
  argv(&[
    "curl",
    "--silent",
    "--show-error",
    "--fail",
    "--upload-file",
    "{artifact}",
    "--header",
    "Authorization: Bearer {api_key}",
    "{source}",
  ])
}

impl Default for CommandsConfig {
  fn default() -> Self {
    Self {
      restore: default_restore(),
      compile: default_compile(),
      test: default_test(),
      pack: default_pack(),
      push: default_push(),
    }
  }
}

impl CommandsConfig {
  fn validate(&self) -> Result<(), ConfigError> {
    for (name, command) in [
      ("restore", &self.restore),
      ("compile", &self.compile),
      ("test", &self.test),
      ("pack", &self.pack),
      ("push", &self.push),
    ] {
      if command.first().is_none_or(|program| program.trim().is_empty()) {
        return Err(ConfigError::EmptyCommand { name: name.to_string() });
      }
    }
    Ok(())
  }
}

impl ReleaseConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from release.toml (searches multiple locations)
  pub fn load(path: &Path) -> ReleaseResult<(Self, PathBuf)> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      ReleaseError::Config(ConfigError::NotFound {
        workspace_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).map_err(|reason| ConfigError::Invalid {
      path: config_path.clone(),
      reason,
    })?;

    Ok((config, config_path))
  }

  /// Parse and validate configuration text
  pub fn parse(content: &str) -> Result<Self, String> {
    let config: ReleaseConfig = toml_edit::de::from_str(content).map_err(|e| e.to_string())?;
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    let name = &self.package.name;
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '~' | '^')) {
      return Err(ConfigError::Invalid {
        path: PathBuf::from("[package].name"),
        reason: format!("'{}' cannot be used in tag and file names", name),
      });
    }
    if self.output.artifact_extension.trim_start_matches('.').is_empty() {
      return Err(ConfigError::Invalid {
        path: PathBuf::from("[output].artifact_extension"),
        reason: "must not be empty".to_string(),
      });
    }
    self.commands.validate()
  }

  /// Absolute package directory ("." is the root itself)
  pub fn package_dir(&self, root: &Path) -> PathBuf {
    if self.package.dir == Path::new(".") {
      root.to_path_buf()
    } else {
      root.join(&self.package.dir)
    }
  }
}

/// Fully resolved, absolute settings for one pipeline run
#[derive(Debug, Clone)]
pub struct ReleaseSettings {
  pub package: String,
  pub package_dir: PathBuf,
  pub output_dir: PathBuf,
  pub bin_dir: PathBuf,
  pub artifact_extension: String,
  pub configuration: BuildConfiguration,
  pub policy: PolicyConfig,
}

impl ReleaseSettings {
  /// Resolve paths against `root` for the chosen build configuration
  pub fn resolve(root: &Path, config: &ReleaseConfig, configuration: BuildConfiguration) -> Self {
    let package_dir = config.package_dir(root);
    let bin_dir = config
      .output
      .bin_dir
      .replace("{profile_dir}", configuration.profile_dir())
      .replace("{configuration}", configuration.name());

    Self {
      package: config.package.name.clone(),
      output_dir: root.join(&config.output.dir),
      bin_dir: package_dir.join(bin_dir),
      package_dir,
      artifact_extension: config.output.artifact_extension.trim_start_matches('.').to_string(),
      configuration,
      policy: config.policy,
    }
  }

  /// Deterministic artifact location for `version`
  pub fn artifact_path(&self, version: Version) -> PathBuf {
    self
      .output_dir
      .join(format!("{}-{}.{}", self.package, version, self.artifact_extension))
  }
}
