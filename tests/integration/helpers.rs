//! Test helpers for integration tests

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A node monorepo with git history
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Empty repository with a committed root package.json
  pub fn new(package_json: Value) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    let workspace = Self { _root: root, path };
    workspace.write_json("package.json", &package_json)?;
    workspace.commit("Initial workspace setup")?;
    Ok(workspace)
  }

  /// Repository seeded from a directory under tests/fixtures
  pub fn from_fixture(name: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    let source = fixture_path(name);
    for entry in std::fs::read_dir(&source)? {
      let entry = entry?;
      if entry.file_type()?.is_file() {
        std::fs::copy(entry.path(), path.join(entry.file_name()))?;
      }
    }

    let workspace = Self { _root: root, path };
    workspace.commit("Import fixture")?;
    Ok(workspace)
  }

  /// Add a workspace package under `dir`
  pub fn add_package(&self, dir: &str, name: &str, deps: &[&str]) -> Result<()> {
    let dependencies: serde_json::Map<String, Value> =
      deps.iter().map(|d| (d.to_string(), Value::String("*".to_string()))).collect();
    self.write_json(
      &format!("{}/package.json", dir),
      &serde_json::json!({ "name": name, "version": "0.0.0", "dependencies": dependencies }),
    )?;
    self.write_file(&format!("{}/index.js", dir), "module.exports = {};\n")
  }

  pub fn write_file(&self, rel: &str, content: &str) -> Result<()> {
    let path = self.path.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", rel))
  }

  pub fn write_json(&self, rel: &str, value: &Value) -> Result<()> {
    self.write_file(rel, &format!("{}\n", serde_json::to_string_pretty(value)?))
  }

  /// Stage everything and commit; returns the new HEAD sha
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "-A"])?;
    git(&self.path, &["commit", "--allow-empty", "-m", message])?;
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn file_exists(&self, rel: &str) -> bool {
    self.path.join(rel).exists()
  }

  pub fn read_file(&self, rel: &str) -> Result<String> {
    std::fs::read_to_string(self.path.join(rel)).with_context(|| format!("Failed to read {}", rel))
  }

  pub fn read_json(&self, rel: &str) -> Result<Value> {
    Ok(serde_json::from_str(&self.read_file(rel)?)?)
  }
}

pub fn fixture_path(name: &str) -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

/// Run a git command, failing on non-zero exit
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

/// Run the turbo-tools binary without checking its exit status
pub fn run_turbo_tools(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_turbo-tools");

  let mut command = Command::new(bin);
  command
    .current_dir(cwd)
    .args(args)
    .env_remove("VERCEL")
    .env_remove("VERCEL_GIT_PREVIOUS_SHA")
    .env_remove("VERCEL_GIT_COMMIT_REF");
  for (key, value) in env {
    command.env(key, value);
  }

  command.output().context("Failed to run turbo-tools")
}

/// Run the turbo-tools binary, failing on non-zero exit
pub fn run_turbo_tools_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_turbo_tools(cwd, args, &[])?;
  if !output.status.success() {
    anyhow::bail!(
      "turbo-tools command failed: turbo-tools {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }
  Ok(output)
}
