//! Package version: `major.minor.build`
//!
//! Major and minor are owned by the operator. The pipeline only ever advances
//! the build component, by exactly one per release cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A three-component package version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
  pub major: u64,
  pub minor: u64,
  pub build: u64,
}

/// Text that does not hold a `major.minor.build` version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError {
  pub input: String,
}

impl fmt::Display for ParseVersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}' is not a major.minor.build version", self.input)
  }
}

impl std::error::Error for ParseVersionError {}

impl Version {
  pub const fn new(major: u64, minor: u64, build: u64) -> Self {
    Self { major, minor, build }
  }

  /// The candidate for the next release: build + 1, major/minor unchanged
  ///
  /// `None` once the build component cannot grow any further.
  pub fn next(self) -> Option<Self> {
    let build = self.build.checked_add(1)?;
    Some(Self { build, ..self })
  }

  /// Source-control tag for this version of `package`
  pub fn tag_for(&self, package: &str) -> String {
    format!("{}-{}", package, self)
  }
}

impl FromStr for Version {
  type Err = ParseVersionError;

  /// Parses exactly three dot-separated non-negative integers.
  ///
  /// Surrounding whitespace (a trailing newline left by an editor) is ignored;
  /// pre-release and build-metadata suffixes are rejected.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let err = || ParseVersionError { input: s.to_string() };
    let trimmed = s.trim();

    if trimmed.split('.').count() != 3 || !trimmed.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
      return Err(err());
    }

    // Leading zeros ("1.02.3") are accepted; semver would reject them
    let normalized: Vec<String> = trimmed
      .split('.')
      .map(|part| {
        let stripped = part.trim_start_matches('0');
        if stripped.is_empty() && !part.is_empty() { "0" } else { stripped }.to_string()
      })
      .collect();

    let parsed = semver::Version::parse(&normalized.join(".")).map_err(|_| err())?;
    if !parsed.pre.is_empty() || !parsed.build.is_empty() {
      return Err(err());
    }

    Ok(Self::new(parsed.major, parsed.minor, parsed.patch))
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.build)
  }
}

impl TryFrom<String> for Version {
  type Error = ParseVersionError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Version> for String {
  fn from(value: Version) -> Self {
    value.to_string()
  }
}
