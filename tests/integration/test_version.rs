//! Integration tests for `release-rail version`

use crate::helpers::{TestRepo, git, release_rail};
use anyhow::Result;

#[test]
fn test_version_show() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;

  let output = release_rail(&repo.path, &["version", "show", "--json"])?;
  let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(info["package"], "core");
  assert_eq!(info["version"], "1.2.7");
  assert_eq!(info["tag"], "core-1.2.7");
  assert_eq!(info["tag_exists"], false);

  Ok(())
}

#[test]
fn test_version_next_is_read_only() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;

  let output = release_rail(&repo.path, &["version", "next"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("1.2.7 → 1.2.8"), "stdout: {stdout}");
  assert!(stdout.contains("core-1.2.8"), "stdout: {stdout}");
  assert_eq!(repo.record()?, "1.2.7");

  Ok(())
}

#[test]
fn test_version_next_warns_about_existing_tag() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;
  git(&repo.path, &["tag", "core-1.2.8"])?;

  let output = release_rail(&repo.path, &["version", "next"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("already exists"), "stdout: {stdout}");

  let output = release_rail(&repo.path, &["version", "next", "--json"])?;
  let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(info["tag_exists"], true);

  Ok(())
}

#[test]
fn test_version_record_normalized() -> Result<()> {
  let repo = TestRepo::new(" 01.02.007\n")?;

  let output = release_rail(&repo.path, &["version", "show", "--json"])?;
  let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(info["version"], "1.2.7");

  Ok(())
}

#[test]
fn test_version_show_reports_dirty_working_copy() -> Result<()> {
  let repo = TestRepo::new("1.2.7")?;

  let output = release_rail(&repo.path, &["version", "show", "--json"])?;
  let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(info["working_copy_clean"], true);

  std::fs::write(repo.path.join("Ver.core.txt"), "1.2.9")?;
  let output = release_rail(&repo.path, &["version", "show"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Pack will refuse to run"), "stdout: {stdout}");

  Ok(())
}
