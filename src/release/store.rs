//! Persisted version record for a package
//!
//! One plain-text file per package, `Ver.<package>.txt` in the package's own
//! directory, holding `major.minor.build` and nothing else. It is the single
//! source of truth for the package version.

use super::version::Version;
use crate::core::error::{ReleaseResult, ResultExt, VersionError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and writes the version record of one package
#[derive(Debug, Clone)]
pub struct VersionStore {
  path: PathBuf,
}

impl VersionStore {
  /// Store for `package` whose record lives in `package_dir`
  pub fn new(package_dir: &Path, package: &str) -> Self {
    Self {
      path: package_dir.join(Self::record_file_name(package)),
    }
  }

  /// Deterministic record file name for a package identifier
  pub fn record_file_name(package: &str) -> String {
    format!("Ver.{}.txt", package.to_lowercase())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Read the current version
  pub fn current(&self) -> ReleaseResult<Version> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        return Err(VersionError::RecordMissing { path: self.path.clone() }.into());
      }
      Err(e) => {
        return Err(e).with_context(|| format!("Failed to read version record {}", self.path.display()));
      }
    };

    content.parse().map_err(|_| {
      VersionError::MalformedVersionRecord {
        path: self.path.clone(),
        content: content.trim().to_string(),
      }
      .into()
    })
  }

  /// The current version with the build component advanced by one
  pub fn next(&self) -> ReleaseResult<Version> {
    Self::advance(self.current()?)
  }

  /// `current` advanced by one build, or `BuildNumberExhausted`
  pub fn advance(current: Version) -> ReleaseResult<Version> {
    current.next().ok_or_else(|| {
      VersionError::BuildNumberExhausted {
        version: current.to_string(),
      }
      .into()
    })
  }

  /// Overwrite the record with `version`
  pub fn persist(&self, version: Version) -> ReleaseResult<()> {
    debug!(path = %self.path.display(), %version, "Writing version record");
    fs::write(&self.path, version.to_string())
      .with_context(|| format!("Failed to write version record {}", self.path.display()))
  }
}
