//! Integration tests for `create`

use crate::helpers::*;
use anyhow::Result;
use serde_json::Value;
use tempfile::TempDir;

fn read_json(path: &std::path::Path) -> Result<Value> {
  Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

#[test]
fn test_create_builtin_starter() -> Result<()> {
  let dir = TempDir::new()?;
  let output = run_turbo_tools_ok(
    dir.path(),
    &["create", "acme", "--package-manager", "npm", "--skip-install", "--turbo-version", "2.0.0"],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Next steps"), "stdout:\n{}", stdout);

  let root = dir.path().join("acme");
  let package_json = read_json(&root.join("package.json"))?;
  assert_eq!(package_json["name"], "acme");
  assert_eq!(package_json["devDependencies"]["turbo"], "2.0.0");
  assert!(root.join("turbo.json").is_file());
  assert!(root.join(".gitignore").is_file());
  assert!(root.join("apps/web/package.json").is_file());
  Ok(())
}

#[test]
fn test_create_from_local_example() -> Result<()> {
  let source = TempDir::new()?;
  std::fs::write(
    source.path().join("package.json"),
    r#"{ "name": "kitchen-sink", "devDependencies": { "turbo": "latest" } }"#,
  )?;
  std::fs::write(source.path().join("meta.json"), "{}")?;
  std::fs::create_dir_all(source.path().join("node_modules/left-pad"))?;
  std::fs::write(source.path().join("node_modules/left-pad/index.js"), "")?;

  let dir = TempDir::new()?;
  let example = source.path().display().to_string();
  run_turbo_tools_ok(
    dir.path(),
    &["create", "sink", "--example", &example, "--skip-install", "--package-manager", "npm"],
  )?;

  let root = dir.path().join("sink");
  assert_eq!(read_json(&root.join("package.json"))?["name"], "kitchen-sink");
  assert!(!root.join("meta.json").exists());
  assert!(!root.join("node_modules").exists());
  Ok(())
}

#[test]
fn test_create_skip_transforms_copies_as_is() -> Result<()> {
  let dir = TempDir::new()?;
  run_turbo_tools_ok(dir.path(), &["create", "raw", "--skip-install", "--skip-transforms"])?;

  let root = dir.path().join("raw");
  let package_json = read_json(&root.join("package.json"))?;
  assert_eq!(package_json["name"], "my-turborepo");
  assert!(package_json.get("packageManager").is_none());
  assert!(!root.join(".gitignore").exists());
  Ok(())
}

#[test]
fn test_create_rejects_non_empty_directory() -> Result<()> {
  let dir = TempDir::new()?;
  std::fs::create_dir_all(dir.path().join("taken"))?;
  std::fs::write(dir.path().join("taken/file.txt"), "hi")?;

  let output = run_turbo_tools(dir.path(), &["create", "taken", "--skip-install"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("not empty"), "stderr:\n{}", stderr);
  Ok(())
}
