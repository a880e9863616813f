//! Blocking execution of external collaborator commands

use crate::utils::display_command;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::debug;

/// Lines of output kept in error details
const DETAIL_LINES: usize = 20;

/// Result of running one external command to completion
#[derive(Debug, Clone)]
pub struct CommandOutcome {
  /// Command line as logged (secrets masked)
  pub display: String,

  /// Exit code (-1 when terminated by a signal)
  pub exit_code: i32,

  pub stdout: String,
  pub stderr: String,
  pub duration_ms: u64,
  pub success: bool,
}

impl CommandOutcome {
  /// Tail of the most informative output stream, for error messages
  pub fn detail(&self) -> String {
    let stream = if self.stderr.trim().is_empty() { &self.stdout } else { &self.stderr };
    let lines: Vec<&str> = stream.lines().collect();
    let tail = lines[lines.len().saturating_sub(DETAIL_LINES)..].join("\n");

    if tail.trim().is_empty() {
      format!("`{}` exited with code {}", self.display, self.exit_code)
    } else {
      format!("`{}` exited with code {}\n{}", self.display, self.exit_code, tail)
    }
  }

  /// Both streams together, for classification
  pub fn combined_output(&self) -> String {
    format!("{}\n{}", self.stdout, self.stderr)
  }
}

/// Run `argv` in `cwd` with extra environment variables, blocking until it exits
///
/// `secrets` are masked in the logged command line.
pub fn run_command(argv: &[String], cwd: &Path, env: &[(&str, String)], secrets: &[&str]) -> io::Result<CommandOutcome> {
  let (program, args) = argv
    .split_first()
    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

  let shown = display_command(argv, secrets);
  debug!(command = %shown, cwd = %cwd.display(), "Running command");

  let start = Instant::now();
  let output = Command::new(program)
    .args(args)
    .current_dir(cwd)
    .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
    .stdin(Stdio::null())
    .output()?;

  let outcome = CommandOutcome {
    display: shown,
    exit_code: output.status.code().unwrap_or(-1),
    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    duration_ms: start.elapsed().as_millis() as u64,
    success: output.status.success(),
  };

  debug!(command = %outcome.display, exit_code = outcome.exit_code, duration_ms = outcome.duration_ms, "Command finished");
  Ok(outcome)
}
