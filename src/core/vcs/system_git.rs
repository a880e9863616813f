//! System git backend - zero dependencies
//!
//! Every operation is one `git` subprocess run with an isolated environment.

use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Directory git runs in (`git -C`); relative pathspecs resolve against it
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ReleaseError::message(format!("Failed to open git repository: {}", stderr)));
    }

    debug!(work_tree = %String::from_utf8_lossy(&output.stdout).trim(), "Opened git repository");

    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  /// `path` relative to the repository path when it lies inside it
  pub(crate) fn relative_path<'p>(&self, path: &'p Path) -> &'p Path {
    path.strip_prefix(&self.repo_path).unwrap_or(path)
  }

  /// Run a git command, mapping a non-zero exit to `GitError::CommandFailed`
  pub(crate) fn run(&self, args: &[&str], what: &str) -> ReleaseResult<Output> {
    debug!(command = %format!("git {}", args.join(" ")), "Running git");
    let output = self.git_cmd().args(args).output().context(what)?;

    if !output.status.success() {
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(output)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
    cmd.arg("-c").arg("tag.gpgSign=false");

    cmd
  }
}
