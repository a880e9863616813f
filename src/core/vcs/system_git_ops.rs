//! Release operations for SystemGit (cleanliness, tags, version-bump commits)

use super::SourceControl;
use super::system_git::SystemGit;
use crate::core::error::{GitError, ReleaseError, ReleaseResult};
use crate::release::Version;
use crate::utils::path_to_git_format;
use std::path::Path;
use tracing::{debug, info};

impl SystemGit {
  /// Check whether a tag exists
  pub fn tag_exists(&self, name: &str) -> ReleaseResult<bool> {
    let reference = format!("refs/tags/{}", name);
    let output = self
      .git_cmd()
      .args(["rev-parse", "--quiet", "--verify", &reference])
      .output()
      .map_err(|e| ReleaseError::message(format!("Failed to run git rev-parse: {}", e)))?;

    Ok(output.status.success())
  }

  /// List tags matching a glob pattern
  pub fn list_tags(&self, pattern: &str) -> ReleaseResult<Vec<String>> {
    let output = self.run(&["tag", "--list", pattern], "Failed to list tags")?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect(),
    )
  }
}

impl SourceControl for SystemGit {
  fn local_changes(&self) -> ReleaseResult<Vec<String>> {
    // Untracked files count as modifications; ignored files do not
    let output = self.run(&["status", "--porcelain"], "Failed to get working copy status")?;

    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect(),
    )
  }

  fn tag(&self, name: &str, message: &str) -> ReleaseResult<()> {
    if self.tag_exists(name)? {
      return Err(GitError::DuplicateTag { tag: name.to_string() }.into());
    }

    match self.run(&["tag", "-a", name, "-m", message], "Failed to create tag") {
      Ok(_) => {
        info!(tag = name, "Created tag");
        Ok(())
      }
      Err(ReleaseError::Git(GitError::CommandFailed { stderr, .. })) if stderr.contains("already exists") => {
        Err(GitError::DuplicateTag { tag: name.to_string() }.into())
      }
      Err(e) => Err(e),
    }
  }

  fn commit_version_bump(&self, record: &Path, package: &str, version: Version) -> ReleaseResult<()> {
    let record = path_to_git_format(self.relative_path(record));
    let message = format!("Version number of {} updated to {} by the release pipeline", package, version);

    self.run(&["add", "--", &record], "Failed to stage version record")?;
    // Commit only the record, even if something else was staged meanwhile
    self.run(&["commit", "-m", &message, "--", &record], "Failed to commit version bump")?;

    debug!(record = %record, %version, "Committed version bump");
    Ok(())
  }
}
