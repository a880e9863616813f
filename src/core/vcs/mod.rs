pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::ReleaseResult;
use crate::release::Version;
use std::path::Path;

/// Source-control operations the release pipeline depends on
///
/// `SystemGit` is the production backend; the pipeline tests substitute an
/// in-memory fake.
pub trait SourceControl {
  /// Porcelain status lines for staged, unstaged and untracked changes
  fn local_changes(&self) -> ReleaseResult<Vec<String>>;

  /// True iff there are no local modifications relative to HEAD
  fn is_clean(&self) -> ReleaseResult<bool> {
    Ok(self.local_changes()?.is_empty())
  }

  /// Create an immutable tag at HEAD; fails with `DuplicateTag` if it exists
  fn tag(&self, name: &str, message: &str) -> ReleaseResult<()>;

  /// Stage the version record and commit it
  fn commit_version_bump(&self, record: &Path, package: &str, version: Version) -> ReleaseResult<()>;
}
