//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Build steps that need nothing but `sh` and `tar`
///
/// Compile writes the version stamp into the bin dir, Test checks it is there,
/// Pack tars the bin dir into `{artifact}` and Push copies the artifact into the
/// directory named by the credential source, rejecting any key but `good-key`.
pub const SHELL_COMMANDS: &str = r#"
[commands]
restore = ["sh", "-c", "true"]
compile = ["sh", "-c", "mkdir -p \"$1\" && echo \"$RELEASE_VERSION\" > \"$1/VERSION\"", "compile", "{bin_dir}"]
test = ["sh", "-c", "test -f \"$1/VERSION\"", "test", "{bin_dir}"]
pack = ["sh", "-c", "tar -czf \"$1\" -C \"$2\" .", "pack", "{artifact}", "{bin_dir}"]
push = ["sh", "-c", "[ \"$RELEASE_REGISTRY_API_KEY\" = good-key ] || { echo 'HTTP 401 Unauthorized' >&2; exit 22; }; mkdir -p \"$2\" && cp \"$1\" \"$2/\"", "push", "{artifact}", "{source}"]
"#;

/// A git repository holding one releasable package
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  /// Repository with `core` at `version`, shell build commands, everything committed
  pub fn new(version: &str) -> Result<Self> {
    Self::with_config(version, "")
  }

  /// Like [`TestRepo::new`], with extra release.toml content after `[package]`
  pub fn with_config(version: &str, extra: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    std::fs::write(path.join(".gitignore"), "output/\ntarget/\n")?;
    std::fs::write(path.join("Ver.core.txt"), version)?;
    std::fs::write(
      path.join("release.toml"),
      format!("[package]\nname = \"core\"\n{}\n{}", extra, SHELL_COMMANDS),
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial package setup"])?;

    Ok(Self { _root: root, path })
  }

  /// Replace one command template in release.toml and commit it
  pub fn set_command(&self, name: &str, argv: &str) -> Result<()> {
    let config = self.read_file("release.toml")?;
    let line = config
      .lines()
      .find(|l| l.starts_with(&format!("{} = ", name)))
      .with_context(|| format!("no '{}' command in release.toml", name))?
      .to_string();
    std::fs::write(
      self.path.join("release.toml"),
      config.replace(&line, &format!("{} = {}", name, argv)),
    )?;
    self.commit("Change build commands")?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Current content of the version record
  pub fn record(&self) -> Result<String> {
    self.read_file("Ver.core.txt")
  }

  /// Tags matching `pattern`
  pub fn tags(&self, pattern: &str) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "--list", pattern])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Subject of the HEAD commit
  pub fn head_subject(&self) -> Result<String> {
    let output = git(&self.path, &["log", "-1", "--format=%s"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// `git status --porcelain` lines
  pub fn status(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["status", "--porcelain"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// File names in the output directory
  pub fn artifacts(&self) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(self.path.join("output")) {
      Ok(entries) => entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect(),
      Err(_) => Vec::new(),
    };
    names.sort();
    names
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run release-rail with a controlled environment, whatever its exit status
pub fn release_rail_output(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_release-rail");

  let mut cmd = Command::new(bin);
  cmd.current_dir(cwd).args(args);
  for var in [
    "CI",
    "RUST_LOG",
    "RELEASE_ENVIRONMENT",
    "RELEASE_REGISTRY_API_KEY",
    "RELEASE_REGISTRY_SOURCE",
    "RELEASE_SECRETS_FILE",
  ] {
    cmd.env_remove(var);
  }
  for (key, value) in env {
    cmd.env(key, value);
  }

  cmd.output().context("Failed to run release-rail")
}

/// Run release-rail, failing unless it exits successfully
pub fn release_rail(cwd: &Path, args: &[&str]) -> Result<Output> {
  release_rail_with_env(cwd, args, &[])
}

/// Run release-rail with extra environment, failing unless it exits successfully
pub fn release_rail_with_env(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let output = release_rail_output(cwd, args, env)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "release-rail command failed: release-rail {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
