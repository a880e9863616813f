//! Stage steps: preconditions, actions, postconditions and finalizers
//!
//! Every step receives the run's [`StageContext`]. The next version is computed
//! at most once per run and then reused by every stage that needs it.

use crate::build::BuildTool;
use crate::core::config::{CommitPlacement, ReleaseSettings, TagPlacement};
use crate::core::credentials::CredentialSource;
use crate::core::error::{BuildError, GitError, ReleaseResult, ResultExt};
use crate::core::vcs::SourceControl;
use crate::registry::Registry;
use crate::release::{Version, VersionStore};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// External collaborators of the pipeline
pub struct Gateways {
  pub scm: Box<dyn SourceControl>,
  pub build: Box<dyn BuildTool>,
  pub registry: Box<dyn Registry>,
  pub credentials: Box<dyn CredentialSource>,
}

/// Mutable state shared by the stages of one run
pub struct StageContext<'a> {
  pub settings: &'a ReleaseSettings,
  pub store: &'a VersionStore,
  pub gateways: &'a Gateways,
  pub next_version: Option<Version>,
  pub tag: Option<String>,
  pub artifact: Option<PathBuf>,
  pub artifact_sha256: Option<String>,
  pub version_committed: bool,
}

impl<'a> StageContext<'a> {
  pub fn new(settings: &'a ReleaseSettings, store: &'a VersionStore, gateways: &'a Gateways) -> Self {
    Self {
      settings,
      store,
      gateways,
      next_version: None,
      tag: None,
      artifact: None,
      artifact_sha256: None,
      version_committed: false,
    }
  }

  /// The version this run releases, computed from the record on first use
  fn version(&mut self) -> ReleaseResult<Version> {
    if let Some(version) = self.next_version {
      return Ok(version);
    }
    let current = self.store.current()?;
    let next = VersionStore::advance(current)?;
    info!(%current, %next, "Computed next version");
    self.next_version = Some(next);
    Ok(next)
  }

  fn missing_artifact(&self) -> BuildError {
    let path = match self.next_version {
      Some(version) => self.settings.artifact_path(version),
      None => self.settings.output_dir.clone(),
    };
    BuildError::ArtifactNotProduced { path }
  }

  fn create_tag(&mut self, version: Version) -> ReleaseResult<()> {
    let tag = version.tag_for(&self.settings.package);
    let message = format!("Release {} {}", self.settings.package, version);
    self.gateways.scm.tag(&tag, &message)?;
    self.tag = Some(tag);
    Ok(())
  }

  fn commit_version(&mut self, version: Version) -> ReleaseResult<()> {
    self.store.persist(version)?;
    self
      .gateways
      .scm
      .commit_version_bump(self.store.path(), &self.settings.package, version)?;
    self.version_committed = true;
    info!(%version, record = %self.store.path().display(), "Committed version bump");
    Ok(())
  }
}

/// Remove everything inside `dir`, creating it when missing
pub fn ensure_clean_directory(dir: &Path) -> io::Result<()> {
  if !dir.exists() {
    return fs::create_dir_all(dir);
  }

  for entry in fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_dir() && !path.is_symlink() {
      fs::remove_dir_all(&path)?;
    } else {
      fs::remove_file(&path)?;
    }
  }
  Ok(())
}

pub fn clean(ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  let dir = &ctx.settings.output_dir;
  ensure_clean_directory(dir).with_context(|| format!("Failed to clean output directory {}", dir.display()))
}

pub fn output_dir_is_empty(ctx: &StageContext<'_>) -> ReleaseResult<()> {
  let dir = &ctx.settings.output_dir;
  let mut entries = fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
  if entries.next().is_some() {
    return Err(format!("Output directory {} is not empty after cleaning", dir.display()).into());
  }
  Ok(())
}

pub fn restore(ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  ctx.gateways.build.restore()
}

pub fn compile(ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  let version = ctx.version()?;
  if ctx.settings.policy.tag_at == TagPlacement::Compile {
    ctx.create_tag(version)?;
  }
  ctx.gateways.build.compile(version)
}

pub fn test(ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  ctx.gateways.build.test()
}

pub fn working_copy_is_clean(ctx: &StageContext<'_>) -> ReleaseResult<()> {
  let changes = ctx.gateways.scm.local_changes()?;
  if !changes.is_empty() {
    return Err(GitError::DirtyWorkingCopy { changes }.into());
  }
  Ok(())
}

pub fn pack(ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  let version = ctx.version()?;
  let output_dir = ctx.settings.output_dir.clone();
  fs::create_dir_all(&output_dir).with_context(|| format!("Failed to create {}", output_dir.display()))?;

  let expected = ctx.settings.artifact_path(version);
  let reported = ctx.gateways.build.pack(version, &output_dir)?;
  if reported != expected {
    warn!(reported = %reported.display(), expected = %expected.display(), "Build tool reported an unexpected artifact path");
  }

  ctx.artifact = Some(expected);
  Ok(())
}

/// Shared by Pack (postcondition) and Push (precondition)
pub fn artifact_exists(ctx: &StageContext<'_>) -> ReleaseResult<()> {
  match &ctx.artifact {
    Some(path) if path.is_file() => Ok(()),
    Some(path) => Err(BuildError::ArtifactNotProduced { path: path.clone() }.into()),
    None => Err(ctx.missing_artifact().into()),
  }
}

pub fn finalize_pack(ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  let version = ctx.version()?;

  if let Some(artifact) = ctx.artifact.clone() {
    let digest = sha256_file(&artifact).with_context(|| format!("Failed to hash {}", artifact.display()))?;
    info!(artifact = %artifact.display(), sha256 = %digest, "Artifact produced");
    ctx.artifact_sha256 = Some(digest);

    let others = other_artifacts(&ctx.settings.output_dir, &artifact, &ctx.settings.artifact_extension)
      .with_context(|| format!("Failed to list {}", ctx.settings.output_dir.display()))?;
    if !others.is_empty() {
      let names: Vec<String> = others.iter().map(|p| p.display().to_string()).collect();
      warn!(
        artifact = %artifact.display(),
        others = ?names,
        "Output directory holds more than one artifact; run the Clean stage first to remove stale ones"
      );
    }
  }

  if ctx.settings.policy.tag_at == TagPlacement::Pack {
    ctx.create_tag(version)?;
  }
  if ctx.settings.policy.commit_at == CommitPlacement::Pack {
    ctx.commit_version(version)?;
  }
  Ok(())
}

pub fn push(ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  let artifact = ctx.artifact.clone().ok_or_else(|| ctx.missing_artifact())?;
  let credential = ctx.gateways.credentials.resolve()?;
  ctx.gateways.registry.push(&artifact, &credential)
}

pub fn finalize_push(ctx: &mut StageContext<'_>) -> ReleaseResult<()> {
  if ctx.settings.policy.commit_at == CommitPlacement::Push {
    let version = ctx.version()?;
    ctx.commit_version(version)?;
  }
  Ok(())
}

/// Files in `dir` with `extension` other than `expected`
fn other_artifacts(dir: &Path, expected: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
  let suffix = format!(".{}", extension);
  let mut others = Vec::new();
  for entry in fs::read_dir(dir)? {
    let path = entry?.path();
    let matches = path.file_name().is_some_and(|n| n.to_string_lossy().ends_with(&suffix));
    if matches && path.is_file() && path != expected {
      others.push(path);
    }
  }
  others.sort();
  Ok(others)
}

fn sha256_file(path: &Path) -> io::Result<String> {
  let mut file = fs::File::open(path)?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher)?;
  Ok(format!("{:x}", hasher.finalize()))
}
