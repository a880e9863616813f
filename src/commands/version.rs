//! `release-rail version`: inspect the version record

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::vcs::{SourceControl, SystemGit};
use crate::release::Version;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct VersionOutput {
  package: String,
  record: PathBuf,
  version: Version,
  tag: String,
  /// None when the root is not inside a git repository
  tag_exists: Option<bool>,
  working_copy_clean: Option<bool>,
}

fn describe(ctx: &ReleaseContext, version: Version) -> ReleaseResult<VersionOutput> {
  let tag = version.tag_for(ctx.package());
  let (tag_exists, working_copy_clean) = match SystemGit::open(&ctx.root) {
    Ok(git) => (Some(git.tag_exists(&tag)?), Some(git.is_clean()?)),
    Err(_) => (None, None),
  };

  Ok(VersionOutput {
    package: ctx.package().to_string(),
    record: ctx.version_store().path().to_path_buf(),
    version,
    tag,
    tag_exists,
    working_copy_clean,
  })
}

/// Print the version currently held by the record
pub fn run_version_show(ctx: &ReleaseContext, json: bool) -> ReleaseResult<()> {
  let current = ctx.version_store().current()?;
  let output = describe(ctx, current)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&output)?);
    return Ok(());
  }

  println!("📦 {} {}", output.package, output.version);
  println!("   Record: {}", output.record.display());
  match output.tag_exists {
    Some(true) => println!("   Tag:    {}", output.tag),
    Some(false) => println!("   Tag:    {} (not created)", output.tag),
    None => {}
  }

  if let Ok(git) = SystemGit::open(&ctx.root) {
    let released = git.list_tags(&format!("{}-*", output.package))?;
    if !released.is_empty() {
      println!("   Release tags: {}", released.len());
    }
  }
  if output.working_copy_clean == Some(false) {
    println!();
    println!("⚠️  Working copy has local changes; Pack will refuse to run");
  }

  Ok(())
}

/// Print the version the next run would release, without changing anything
pub fn run_version_next(ctx: &ReleaseContext, json: bool) -> ReleaseResult<()> {
  let store = ctx.version_store();
  let current = store.current()?;
  let output = describe(ctx, store.next()?)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&output)?);
    return Ok(());
  }

  println!("📦 {} {} → {}", output.package, current, output.version);
  println!("   Tag: {}", output.tag);
  if output.tag_exists == Some(true) {
    println!();
    println!("⚠️  Tag '{}' already exists; a run would fail with a duplicate tag", output.tag);
  }

  Ok(())
}
