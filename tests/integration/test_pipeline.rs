//! Integration tests for `release-rail run` up to Pack

use crate::helpers::{TestRepo, release_rail, release_rail_output};
use anyhow::Result;

#[test]
fn test_pack_releases_next_version() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;

  let output = release_rail(&repo.path, &["run"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("succeeded"), "stdout: {stdout}");
  assert_eq!(repo.artifacts(), vec!["core-1.2.8.tar.gz"]);
  assert_eq!(repo.record()?, "1.2.8");
  assert_eq!(repo.tags("core-*")?, vec!["core-1.2.8"]);
  assert_eq!(
    repo.head_subject()?,
    "Version number of core updated to 1.2.8 by the release pipeline"
  );
  assert!(repo.status()?.is_empty(), "version bump should be committed");

  Ok(())
}

#[test]
fn test_compile_stamps_and_tags_without_bumping() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;

  release_rail(&repo.path, &["run", "compile"])?;

  assert_eq!(repo.read_file("target/debug/VERSION")?.trim(), "1.2.8");
  assert_eq!(repo.tags("core-*")?, vec!["core-1.2.8"]);
  assert_eq!(repo.record()?, "1.2.7");
  assert!(repo.artifacts().is_empty());

  Ok(())
}

#[test]
fn test_release_configuration_uses_release_bin_dir() -> Result<()> {
  let repo = TestRepo::new("2.0.0")?;

  release_rail(&repo.path, &["run", "compile", "--configuration", "release"])?;

  assert_eq!(repo.read_file("target/release/VERSION")?.trim(), "2.0.1");
  assert!(!repo.file_exists("target/debug/VERSION"));

  Ok(())
}

#[test]
fn test_dirty_working_copy_blocks_pack() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;
  std::fs::write(repo.path.join("notes.txt"), "uncommitted")?;

  let output = release_rail_output(&repo.path, &["run", "pack"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr.contains("Stage 'Pack' failed"), "stderr: {stderr}");
  assert!(stderr.contains("not clean"), "stderr: {stderr}");
  assert!(stderr.contains("notes.txt"), "help should list the change: {stderr}");
  assert!(repo.artifacts().is_empty());
  assert!(repo.tags("core-*")?.is_empty(), "no tag may be left behind");
  assert_eq!(repo.record()?, "1.2.7");

  // once the tree is clean the same version is released
  std::fs::remove_file(repo.path.join("notes.txt"))?;
  release_rail(&repo.path, &["run", "pack"])?;
  assert_eq!(repo.tags("core-*")?, vec!["core-1.2.8"]);
  assert_eq!(repo.record()?, "1.2.8");

  Ok(())
}

#[test]
fn test_failing_tests_stop_the_run() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;
  repo.set_command("test", r#"["sh", "-c", "echo 'test result: FAILED' >&2; exit 101"]"#)?;

  let output = release_rail_output(&repo.path, &["run", "push"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(4));
  assert!(stderr.contains("Stage 'Test' failed: Tests failed"), "stderr: {stderr}");
  assert!(stderr.contains("test result: FAILED"), "stderr: {stderr}");
  assert!(repo.artifacts().is_empty());
  assert_eq!(repo.record()?, "1.2.7");

  Ok(())
}

#[test]
fn test_pack_without_artifact_fails() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;
  repo.set_command("pack", r#"["sh", "-c", "true"]"#)?;

  let output = release_rail_output(&repo.path, &["run"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(4));
  assert!(stderr.contains("Artifact not produced"), "stderr: {stderr}");
  assert!(stderr.contains("core-1.2.8.tar.gz"), "stderr: {stderr}");
  assert_eq!(repo.record()?, "1.2.7");

  Ok(())
}

#[test]
fn test_rerun_after_failure_hits_duplicate_tag() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;
  repo.set_command("test", r#"["sh", "-c", "exit 1"]"#)?;

  assert!(!release_rail_output(&repo.path, &["run"], &[])?.status.success());
  assert_eq!(repo.tags("core-*")?, vec!["core-1.2.8"]);

  let output = release_rail_output(&repo.path, &["run"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr.contains("Tag 'core-1.2.8' already exists"), "stderr: {stderr}");
  assert!(stderr.contains("git tag -d core-1.2.8"), "stderr: {stderr}");
  assert_eq!(repo.tags("core-*")?, vec!["core-1.2.8"]);

  Ok(())
}

#[test]
fn test_tag_at_pack_leaves_no_tag_on_failure() -> Result<()> {
  let repo = TestRepo::with_config("1.2.7", "\n[policy]\ntag_at = \"pack\"\n")?;
  repo.set_command("test", r#"["sh", "-c", "exit 1"]"#)?;

  assert!(!release_rail_output(&repo.path, &["run"], &[])?.status.success());
  assert!(repo.tags("core-*")?.is_empty());

  repo.set_command("test", r#"["sh", "-c", "true"]"#)?;
  release_rail(&repo.path, &["run"])?;
  assert_eq!(repo.tags("core-*")?, vec!["core-1.2.8"]);
  assert_eq!(repo.record()?, "1.2.8");

  Ok(())
}

#[test]
fn test_consecutive_releases_advance_build_number() -> Result<()> {
  let repo = TestRepo::new("0.9.0")?;

  release_rail(&repo.path, &["run", "clean", "pack"])?;
  release_rail(&repo.path, &["run", "clean", "pack"])?;

  assert_eq!(repo.record()?, "0.9.2");
  assert_eq!(repo.tags("core-*")?, vec!["core-0.9.1", "core-0.9.2"]);
  assert_eq!(repo.artifacts(), vec!["core-0.9.2.tar.gz"]);

  Ok(())
}

#[test]
fn test_clean_empties_output_directory() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;
  std::fs::create_dir_all(repo.path.join("output/nested"))?;
  std::fs::write(repo.path.join("output/stale-0.0.1.tar.gz"), "old")?;

  release_rail(&repo.path, &["run", "clean"])?;
  assert!(repo.file_exists("output"));
  assert!(repo.artifacts().is_empty());

  // Already empty
  release_rail(&repo.path, &["run", "clean"])?;
  assert!(repo.artifacts().is_empty());

  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;

  let output = release_rail(&repo.path, &["run", "--json"])?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(report["success"], true);
  assert_eq!(report["package"], "core");
  assert_eq!(report["configuration"], "debug");
  assert_eq!(report["version"], "1.2.8");
  assert_eq!(report["tag"], "core-1.2.8");
  assert_eq!(report["version_committed"], true);
  assert_eq!(report["artifact_sha256"].as_str().map(str::len), Some(64));
  assert_eq!(
    report["plan"],
    serde_json::json!(["restore", "compile", "test", "pack"])
  );

  Ok(())
}

#[test]
fn test_json_report_on_failure() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;
  repo.set_command("compile", r#"["sh", "-c", "echo 'error[E0425]' >&2; exit 101"]"#)?;

  let output = release_rail_output(&repo.path, &["run", "--json"], &[])?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert!(!output.status.success());
  assert_eq!(report["success"], false);
  assert_eq!(report["failed_stage"], "compile");
  assert!(report["error"].as_str().unwrap_or_default().contains("E0425"));
  let states: Vec<_> = report["stages"]
    .as_array()
    .map(|stages| stages.iter().map(|s| s["state"].clone()).collect())
    .unwrap_or_default();
  assert_eq!(
    states,
    vec![
      serde_json::json!("succeeded"),
      serde_json::json!("failed"),
      serde_json::json!("pending"),
      serde_json::json!("pending")
    ]
  );

  Ok(())
}

#[test]
fn test_malformed_record_is_a_user_error() -> Result<()> {
  let repo = TestRepo::new("1.2")?;

  let output = release_rail_output(&repo.path, &["run", "compile"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("Malformed version record"), "stderr: {stderr}");
  assert!(repo.tags("core-*")?.is_empty());

  Ok(())
}

#[test]
fn test_missing_config() -> Result<()> {
  let dir = tempfile::TempDir::new()?;

  let output = release_rail_output(dir.path(), &["run"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("No release-rail configuration found"), "stderr: {stderr}");

  Ok(())
}
