//! Error types for release-rail with contextual messages and exit codes
//!
//! Every failure a release run can hit is categorized by the collaborator that
//! raised it (version record, git, build tool, registry, configuration). The
//! pipeline wraps whatever a stage raised in [`ReleaseError::PipelineFailed`]
//! so the caller sees the first failing stage together with its root cause.

use crate::pipeline::Stage;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for release-rail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, malformed version record)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Precondition failure (dirty working copy, duplicate tag)
  Validation = 3,
  /// External build or publish step failed
  Stage = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-rail
#[derive(Debug, Error)]
pub enum ReleaseError {
  /// Version record errors
  #[error(transparent)]
  Version(#[from] VersionError),

  /// Git operation errors
  #[error(transparent)]
  Git(#[from] GitError),

  /// Build tool errors
  #[error(transparent)]
  Build(#[from] BuildError),

  /// Package registry errors
  #[error(transparent)]
  Registry(#[from] RegistryError),

  /// Configuration errors
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// I/O errors
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  /// A stage failed; no later stage ran
  #[error("Stage '{stage}' failed: {cause}")]
  PipelineFailed { stage: Stage, cause: Box<ReleaseError> },

  /// Generic error with message and optional context
  #[error("{}", render_message(.message, .context.as_deref()))]
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

fn render_message(message: &str, context: Option<&str>) -> String {
  match context {
    Some(ctx) => format!("{}\n{}", message, ctx),
    None => message.to_string(),
  }
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Wrap a stage failure
  pub fn stage_failed(stage: Stage, cause: ReleaseError) -> Self {
    ReleaseError::PipelineFailed {
      stage,
      cause: Box::new(cause),
    }
  }

  /// Add context to an existing error
  ///
  /// Typed collaborator errors are left untouched so callers can still match on them.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(err) => ReleaseError::Message {
        message: ctx_str,
        context: Some(err.to_string()),
        help: None,
      },
      other => other,
    }
  }

  /// The error a stage originally raised, looking through `PipelineFailed`
  pub fn root_cause(&self) -> &ReleaseError {
    match self {
      ReleaseError::PipelineFailed { cause, .. } => cause.root_cause(),
      other => other,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Version(_) => ExitCode::User,
      ReleaseError::Git(GitError::DirtyWorkingCopy { .. } | GitError::DuplicateTag { .. }) => ExitCode::Validation,
      ReleaseError::Git(_) => ExitCode::System,
      ReleaseError::Build(_) | ReleaseError::Registry(_) => ExitCode::Stage,
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::PipelineFailed { cause, .. } => cause.exit_code(),
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Version(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Build(e) => e.help_message(),
      ReleaseError::Registry(e) => e.help_message(),
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::PipelineFailed { cause, .. } => cause.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

/// Version record errors
#[derive(Debug, Error)]
pub enum VersionError {
  /// The record file does not exist
  #[error("Version record not found: {}", path.display())]
  RecordMissing { path: PathBuf },

  /// The record does not hold `major.minor.build`
  #[error("Malformed version record {}: '{content}' is not major.minor.build", path.display())]
  MalformedVersionRecord { path: PathBuf, content: String },

  /// The build component is already at its largest value
  #[error("Build number of {version} cannot be advanced any further")]
  BuildNumberExhausted { version: String },
}

impl VersionError {
  fn help_message(&self) -> Option<String> {
    match self {
      VersionError::RecordMissing { path } => Some(format!(
        "Create the record with the starting version, e.g. `echo 1.0.0 > {}`",
        path.display()
      )),
      VersionError::MalformedVersionRecord { .. } => {
        Some("The record must contain exactly three non-negative integers, e.g. 1.2.7".to_string())
      }
      VersionError::BuildNumberExhausted { .. } => {
        Some("Bump the minor version in the version record and reset the build number to 0".to_string())
      }
    }
  }
}

/// Git operation errors
#[derive(Debug, Error)]
pub enum GitError {
  /// Git command failed
  #[error("Git command failed: {command}\n{stderr}")]
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  #[error("Git repository not found at: {}", path.display())]
  RepoNotFound { path: PathBuf },

  /// Working copy has local modifications
  #[error("Working copy is not clean ({} change(s))", changes.len())]
  DirtyWorkingCopy { changes: Vec<String> },

  /// Tag already exists
  #[error("Tag '{tag}' already exists")]
  DuplicateTag { tag: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::DirtyWorkingCopy { changes } => {
        let shown: Vec<_> = changes.iter().take(5).map(String::as_str).collect();
        Some(format!(
          "Commit or stash your changes before packing. Modified:\n  {}",
          shown.join("\n  ")
        ))
      }
      GitError::DuplicateTag { tag } => Some(format!(
        "This version was already released. Bump the minor version in the version record, or delete the stale tag with `git tag -d {}` if it was never published.",
        tag
      )),
      GitError::RepoNotFound { path } => Some(format!(
        "Initialize the repository first or check the path: {}",
        path.display()
      )),
      GitError::CommandFailed { .. } => None,
    }
  }
}

/// Build tool errors
#[derive(Debug, Error)]
pub enum BuildError {
  /// Restoring dependencies failed
  #[error("Dependency resolution failed: {detail}")]
  DependencyResolutionFailed { detail: String },

  /// Compilation failed
  #[error("Compile of version {version} failed: {detail}")]
  CompileFailed { version: String, detail: String },

  /// Test suite failed
  #[error("Tests failed: {detail}")]
  TestsFailed { detail: String },

  /// Pack reported success (or not) but the artifact is missing
  #[error("Artifact not produced: {}", path.display())]
  ArtifactNotProduced { path: PathBuf },
}

impl BuildError {
  fn help_message(&self) -> Option<String> {
    match self {
      BuildError::ArtifactNotProduced { .. } => {
        Some("Check that the `pack` command writes to {artifact} (see [commands] in release.toml)".to_string())
      }
      BuildError::TestsFailed { .. } => Some("Fix the failing tests and re-run the pipeline.".to_string()),
      _ => None,
    }
  }
}

/// Package registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
  /// Credentials rejected
  #[error("Registry rejected the credentials for {source_url}: {detail}")]
  Unauthorized { source_url: String, detail: String },

  /// The registry already holds this version
  #[error("Registry already has {}: {detail}", artifact.display())]
  DuplicateVersionRejectedByRegistry { artifact: PathBuf, detail: String },

  /// Registry unreachable
  #[error("Network failure while publishing: {detail}")]
  NetworkFailure { detail: String },

  /// Any other publish failure
  #[error("Publish failed: {detail}")]
  PublishFailed { detail: String },
}

impl RegistryError {
  fn help_message(&self) -> Option<String> {
    match self {
      RegistryError::Unauthorized { .. } => {
        Some("Check RELEASE_REGISTRY_API_KEY or the [registry] section of your configuration.".to_string())
      }
      RegistryError::DuplicateVersionRejectedByRegistry { .. } => {
        Some("Re-run the pipeline to release the next build number.".to_string())
      }
      RegistryError::NetworkFailure { .. } => Some("Retry once the registry is reachable.".to_string()),
      RegistryError::PublishFailed { .. } => None,
    }
  }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
  /// release.toml not found
  #[error("No release-rail configuration found.\nExpected file: {}/release.toml", workspace_root.display())]
  NotFound { workspace_root: PathBuf },

  /// File present but unusable
  #[error("Invalid configuration in {}: {reason}", path.display())]
  Invalid { path: PathBuf, reason: String },

  /// Registry credential incomplete after all layers
  #[error("Missing registry credential field: {field}")]
  MissingCredential { field: String },

  /// Unknown target stage name
  #[error("Unknown stage '{name}'")]
  UnknownStage { name: String },

  /// A command template has no program
  #[error("Command '{name}' is empty")]
  EmptyCommand { name: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create release.toml with at least:\n  [package]\n  name = \"my-package\"".to_string())
      }
      ConfigError::MissingCredential { .. } => Some(
        "Set RELEASE_REGISTRY_API_KEY and RELEASE_REGISTRY_SOURCE, or add a [registry] section.".to_string(),
      ),
      ConfigError::UnknownStage { .. } => {
        Some("Valid stages: clean, restore, compile, test, pack, push".to_string())
      }
      _ => None,
    }
  }
}

/// Result type alias for release-rail
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
