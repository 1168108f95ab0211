//! Integration tests for `transform`

use crate::helpers::*;
use anyhow::Result;
use serde_json::json;

#[test]
fn test_list_shows_every_transform_in_order() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_turbo_tools_ok(dir.path(), &["transform", "--list"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  let positions: Vec<usize> = [
    "add-package-manager",
    "create-turbo-config",
    "migrate-env-var-dependencies",
    "set-default-outputs",
    "stabilize-env-mode",
    "rename-pipeline",
  ]
  .iter()
  .map(|name| stdout.find(name).unwrap_or_else(|| panic!("{} missing from:\n{}", name, stdout)))
  .collect();
  assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order:\n{}", stdout);
  Ok(())
}

#[test]
fn test_rename_pipeline_by_name() -> Result<()> {
  let workspace = TestWorkspace::new(json!({ "name": "repo" }))?;
  workspace.write_json("turbo.json", &json!({ "pipeline": { "build": {} } }))?;
  workspace.commit("Add turbo.json")?;

  let dir = workspace.path.display().to_string();
  run_turbo_tools_ok(&workspace.path, &["transform", "rename-pipeline", &dir])?;
  assert_eq!(workspace.read_json("turbo.json")?, json!({ "tasks": { "build": {} } }));
  Ok(())
}

#[test]
fn test_dry_run_with_print_shows_diff() -> Result<()> {
  let workspace = TestWorkspace::new(json!({ "name": "repo" }))?;
  workspace.write_json("turbo.json", &json!({ "pipeline": { "build": {} } }))?;
  workspace.commit("Add turbo.json")?;
  let before = workspace.read_file("turbo.json")?;

  let dir = workspace.path.display().to_string();
  let output = run_turbo_tools_ok(
    &workspace.path,
    &["transform", "rename-pipeline", &dir, "--dry", "--print"],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("-  \"pipeline\": {"), "stdout:\n{}", stdout);
  assert!(stdout.contains("+  \"tasks\": {"), "stdout:\n{}", stdout);
  assert_eq!(workspace.read_file("turbo.json")?, before);
  Ok(())
}

#[test]
fn test_unknown_transform_exits_1() -> Result<()> {
  let workspace = TestWorkspace::new(json!({ "name": "repo" }))?;
  let output = run_turbo_tools(&workspace.path, &["transform", "does-not-exist"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Unknown transform"), "stderr:\n{}", stderr);
  Ok(())
}

#[test]
fn test_fatal_transform_exits_1() -> Result<()> {
  let workspace = TestWorkspace::new(json!({ "name": "repo" }))?;
  workspace.write_json("turbo.json", &json!({ "pipeline": {}, "tasks": {} }))?;
  workspace.commit("Add turbo.json")?;

  let dir = workspace.path.display().to_string();
  let output = run_turbo_tools(&workspace.path, &["transform", "rename-pipeline", &dir], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(workspace.read_json("turbo.json")?, json!({ "pipeline": {}, "tasks": {} }));
  Ok(())
}
