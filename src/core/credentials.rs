//! Registry credential resolution
//!
//! The credential is assembled from ranked layers, later layers overriding
//! earlier ones field by field:
//!
//! 1. `[registry]` in the base `release.toml`
//! 2. `[registry]` in `release.<environment>.toml`, environment from `RELEASE_ENVIRONMENT`
//! 3. `RELEASE_REGISTRY_API_KEY` / `RELEASE_REGISTRY_SOURCE`
//! 4. `[registry]` in the secrets file named by `RELEASE_SECRETS_FILE`
//!
//! Resolution happens lazily, only when the Push stage asks for it.

use crate::core::error::{ConfigError, ReleaseResult, ResultExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENVIRONMENT_VAR: &str = "RELEASE_ENVIRONMENT";
pub const API_KEY_VAR: &str = "RELEASE_REGISTRY_API_KEY";
pub const SOURCE_VAR: &str = "RELEASE_REGISTRY_SOURCE";
pub const SECRETS_FILE_VAR: &str = "RELEASE_SECRETS_FILE";

/// Resolved `(api key, destination)` pair
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredential {
  pub api_key: String,
  pub source: String,
}

impl fmt::Debug for RegistryCredential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegistryCredential")
      .field("api_key", &"***")
      .field("source", &self.source)
      .finish()
  }
}

/// Anything that can produce a registry credential on demand
pub trait CredentialSource {
  fn resolve(&self) -> ReleaseResult<RegistryCredential>;
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
  #[serde(default)]
  registry: RegistryLayer,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RegistryLayer {
  api_key: Option<String>,
  source: Option<String>,
}

impl RegistryLayer {
  fn overlay(&mut self, other: RegistryLayer) {
    if other.api_key.is_some() {
      self.api_key = other.api_key;
    }
    if other.source.is_some() {
      self.source = other.source;
    }
  }
}

/// Credential source layering files and environment variables
pub struct LayeredCredentials {
  base_file: PathBuf,
  env: BTreeMap<String, String>,
}

impl LayeredCredentials {
  /// `base_file` is the loaded release.toml; `env` a snapshot of the process environment
  pub fn new(base_file: &Path, env: impl IntoIterator<Item = (String, String)>) -> Self {
    Self {
      base_file: base_file.to_path_buf(),
      env: env.into_iter().collect(),
    }
  }

  /// Snapshot the current process environment
  pub fn from_process_env(base_file: &Path) -> Self {
    Self::new(base_file, std::env::vars())
  }

  fn overlay_file(&self) -> Option<PathBuf> {
    let environment = self.env.get(ENVIRONMENT_VAR).filter(|e| !e.is_empty())?;
    let stem = self.base_file.file_stem()?.to_string_lossy();
    Some(self.base_file.with_file_name(format!("{}.{}.toml", stem, environment)))
  }

  fn read_layer(path: &Path, required: bool) -> ReleaseResult<RegistryLayer> {
    if !required && !path.exists() {
      return Ok(RegistryLayer::default());
    }

    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file: RegistryFile = toml_edit::de::from_str(&content).map_err(|e| ConfigError::Invalid {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })?;
    debug!(path = %path.display(), "Loaded registry credential layer");
    Ok(file.registry)
  }

  fn env_layer(&self) -> RegistryLayer {
    let get = |key: &str| self.env.get(key).filter(|v| !v.is_empty()).cloned();
    RegistryLayer {
      api_key: get(API_KEY_VAR),
      source: get(SOURCE_VAR),
    }
  }
}

impl CredentialSource for LayeredCredentials {
  fn resolve(&self) -> ReleaseResult<RegistryCredential> {
    let mut merged = Self::read_layer(&self.base_file, false)?;

    if let Some(overlay) = self.overlay_file() {
      merged.overlay(Self::read_layer(&overlay, false)?);
    }

    merged.overlay(self.env_layer());

    if let Some(secrets) = self.env.get(SECRETS_FILE_VAR).filter(|p| !p.is_empty()) {
      // An explicitly named secrets file must exist
      merged.overlay(Self::read_layer(Path::new(secrets), true)?);
    }

    // A blank value in a file layer counts as unset
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let api_key = present(merged.api_key).ok_or_else(|| ConfigError::MissingCredential {
      field: "api_key".to_string(),
    })?;
    let source = present(merged.source).ok_or_else(|| ConfigError::MissingCredential {
      field: "source".to_string(),
    })?;

    Ok(RegistryCredential { api_key, source })
  }
}
