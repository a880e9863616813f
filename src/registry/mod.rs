//! Package registry boundary
//!
//! Publishing is one external command. Its output is classified into the
//! failure kinds the operator has to react to differently: bad credentials, a
//! version the registry already holds, an unreachable registry, or anything else.

use crate::core::credentials::RegistryCredential;
use crate::core::error::{RegistryError, ReleaseResult};
use crate::core::process::run_command;
use crate::utils::{TemplateVars, expand_template, mask_secrets};
use std::path::{Path, PathBuf};
use tracing::info;

/// Publishes artifacts to a package registry
pub trait Registry {
  fn push(&self, artifact: &Path, credential: &RegistryCredential) -> ReleaseResult<()>;
}

/// Registry client driven by the `push` command template
pub struct CommandRegistry {
  template: Vec<String>,
  package: String,
  working_dir: PathBuf,
}

impl CommandRegistry {
  pub fn new(template: Vec<String>, package: impl Into<String>, working_dir: &Path) -> Self {
    Self {
      template,
      package: package.into(),
      working_dir: working_dir.to_path_buf(),
    }
  }
}

impl Registry for CommandRegistry {
  fn push(&self, artifact: &Path, credential: &RegistryCredential) -> ReleaseResult<()> {
    let mut vars = TemplateVars::new();
    vars.insert("package", self.package.clone());
    vars.insert("artifact", artifact.display().to_string());
    vars.insert("api_key", credential.api_key.clone());
    vars.insert("source", credential.source.clone());

    let argv = expand_template(&self.template, &vars);
    let env = [
      ("RELEASE_REGISTRY_API_KEY", credential.api_key.clone()),
      ("RELEASE_REGISTRY_SOURCE", credential.source.clone()),
    ];

    let outcome = run_command(&argv, &self.working_dir, &env, &[&credential.api_key]).map_err(|e| {
      RegistryError::PublishFailed {
        detail: format!("failed to launch `{}`: {}", self.template.join(" "), e),
      }
    })?;

    if !outcome.success {
      let detail = mask_secrets(&outcome.detail(), &[&credential.api_key]);
      return Err(classify_failure(&outcome.combined_output(), detail, artifact, &credential.source).into());
    }

    info!(artifact = %artifact.display(), source = %credential.source, "Published artifact");
    Ok(())
  }
}

/// Map registry client output to a failure kind
pub fn classify_failure(output: &str, detail: String, artifact: &Path, source: &str) -> RegistryError {
  let lower = output.to_lowercase();
  let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
  let status = |codes: &[&str]| codes.iter().any(|c| has_status_code(&lower, c));

  if status(&["401", "403"]) || has(&["unauthorized", "forbidden", "invalid api key", "authentication"]) {
    RegistryError::Unauthorized {
      source_url: source.to_string(),
      detail,
    }
  } else if status(&["409"]) || has(&["already exists", "conflict", "already been published", "duplicate"]) {
    RegistryError::DuplicateVersionRejectedByRegistry {
      artifact: artifact.to_path_buf(),
      detail,
    }
  } else if has(&[
    "could not resolve",
    "timed out",
    "connection refused",
    "connection reset",
    "network is unreachable",
    "failed to connect",
  ]) {
    RegistryError::NetworkFailure { detail }
  } else {
    RegistryError::PublishFailed { detail }
  }
}

/// Whether `code` appears as a standalone HTTP status, not inside a version or a longer number
fn has_status_code(text: &str, code: &str) -> bool {
  text.match_indices(code).any(|(start, _)| {
    let before = text[..start].chars().next_back();
    let mut after = text[start + code.len()..].chars();
    let next = after.next();

    let joined_before = before.is_some_and(|c| c.is_ascii_digit() || c == '.');
    let joined_after = match next {
      Some(c) if c.is_ascii_digit() => true,
      Some('.') => after.next().is_some_and(|c| c.is_ascii_digit()),
      _ => false,
    };
    !joined_before && !joined_after
  })
}
