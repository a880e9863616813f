//! Utility functions for command templates and cross-platform paths

use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder values substituted into command templates
pub type TemplateVars = BTreeMap<&'static str, String>;

/// Expand `{name}` placeholders in every argument of a command template
///
/// Unknown placeholders are left as-is so literal braces in shell snippets survive.
pub fn expand_template(template: &[String], vars: &TemplateVars) -> Vec<String> {
  template.iter().map(|arg| expand_arg(arg, vars)).collect()
}

fn expand_arg(arg: &str, vars: &TemplateVars) -> String {
  let mut out = String::with_capacity(arg.len());
  let mut rest = arg;

  while let Some(start) = rest.find('{') {
    out.push_str(&rest[..start]);
    let after = &rest[start + 1..];
    match after.find('}') {
      Some(end) if vars.contains_key(&after[..end]) => {
        out.push_str(&vars[&after[..end]]);
        rest = &after[end + 1..];
      }
      _ => {
        out.push('{');
        rest = after;
      }
    }
  }

  out.push_str(rest);
  out
}

/// Replace every occurrence of a non-empty secret in `text` with `***`
pub fn mask_secrets(text: &str, secrets: &[&str]) -> String {
  secrets
    .iter()
    .filter(|s| !s.is_empty())
    .fold(text.to_string(), |acc, secret| acc.replace(secret, "***"))
}

/// Render an expanded command for logs, masking secret values
pub fn display_command(args: &[String], secrets: &[&str]) -> String {
  args
    .iter()
    .map(|arg| mask_secrets(arg, secrets))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
