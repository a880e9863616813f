//! Integration tests for `release-rail plan`

use crate::helpers::{TestRepo, release_rail, release_rail_output};
use anyhow::Result;

#[test]
fn test_plan_defaults_to_pack() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;

  let output = release_rail(&repo.path, &["plan"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  let restore = stdout.find("Restore").unwrap_or(usize::MAX);
  let pack = stdout.find("Pack").unwrap_or(0);
  assert!(restore < pack, "stdout: {stdout}");
  assert!(!stdout.contains("Push"), "stdout: {stdout}");

  Ok(())
}

#[test]
fn test_plan_json_orders_clean_first() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;

  let output = release_rail(&repo.path, &["plan", "push", "clean", "--json"])?;
  let plan: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  let stages: Vec<_> = plan["stages"]
    .as_array()
    .map(|stages| stages.iter().map(|s| s["stage"].clone()).collect())
    .unwrap_or_default();
  assert_eq!(
    serde_json::Value::Array(stages),
    serde_json::json!(["clean", "restore", "compile", "test", "pack", "push"])
  );
  assert_eq!(plan["tag_at"], "compile");
  assert_eq!(plan["commit_at"], "pack");

  Ok(())
}

#[test]
fn test_plan_has_no_side_effects() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;

  release_rail(&repo.path, &["plan", "push"])?;

  assert_eq!(repo.record()?, "1.0.0");
  assert!(repo.tags("*")?.is_empty());
  assert!(!repo.file_exists("output"));

  Ok(())
}

#[test]
fn test_unknown_target() -> Result<()> {
  let repo = TestRepo::new("1.0.0")?;

  let output = release_rail_output(&repo.path, &["plan", "deploy"], &[])?;

  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown stage 'deploy'"));

  Ok(())
}
