//! Integration tests for `migrate`

use crate::helpers::*;
use anyhow::Result;
use serde_json::json;
use std::path::Path;
use turbo_tools::core::error::{ToolError, ToolResult};
use turbo_tools::migrate::{
  GitStatus, MigrateOptions, MigrationEngine, MigrationHost, MigrationOutcome, SystemHost, TransformOutcome,
};
use turbo_tools::core::config::RegistryConfig;
use turbo_tools::workspace::package_manager::PackageManager;
use turbo_tools::workspace::{PackageManagerInfo, Workspace};

/// Real git and workspace loading, with a pinned pnpm version and no network
struct PinnedHost {
  system: SystemHost,
}

impl PinnedHost {
  fn new() -> Self {
    Self {
      system: SystemHost::new(RegistryConfig::default()),
    }
  }
}

impl MigrationHost for PinnedHost {
  fn git_status(&self, root: &Path) -> ToolResult<GitStatus> {
    self.system.git_status(root)
  }

  fn workspace_details(&self, root: &Path) -> ToolResult<Workspace> {
    let mut workspace = Workspace::load(root)?;
    workspace.package_manager = Some(PackageManagerInfo {
      name: PackageManager::Pnpm,
      version: Some("1.2.3".to_string()),
    });
    Ok(workspace)
  }

  fn current_version(&self, _: &Workspace) -> ToolResult<Option<String>> {
    Ok(None)
  }

  fn latest_version(&self) -> ToolResult<Option<String>> {
    Ok(None)
  }

  fn stop_daemon(&self, _: &Path) {}

  fn run_install(&self, _: &Path, _: &str) -> ToolResult<()> {
    Ok(())
  }
}

fn options(from: &str, to: &str) -> MigrateOptions {
  MigrateOptions {
    from: Some(from.to_string()),
    to: Some(to.to_string()),
    ..Default::default()
  }
}

#[test]
fn test_legacy_config_matches_expected_output() -> Result<()> {
  let workspace = TestWorkspace::from_fixture("old-turbo")?;
  let host = PinnedHost::new();

  let outcome = MigrationEngine::new(&host).run(&workspace.path, &options("1.0.0", "1.7.0"))?;
  let MigrationOutcome::Completed(report) = outcome else {
    anyhow::bail!("expected a completed migration");
  };
  assert_eq!(
    report.applied(),
    vec!["add-package-manager", "create-turbo-config", "set-default-outputs"]
  );

  let expected = fixture_path("old-turbo").join("expected");
  assert_eq!(
    workspace.read_file("package.json")?,
    std::fs::read_to_string(expected.join("package.json"))?
  );
  assert_eq!(
    workspace.read_file("turbo.json")?,
    std::fs::read_to_string(expected.join("turbo.json"))?
  );
  Ok(())
}

#[test]
fn test_dry_run_leaves_files_untouched() -> Result<()> {
  let workspace = TestWorkspace::from_fixture("old-turbo")?;
  let before = workspace.read_file("package.json")?;
  let host = PinnedHost::new();

  let mut opts = options("1.0.0", "1.7.0");
  opts.dry = true;
  let outcome = MigrationEngine::new(&host).run(&workspace.path, &opts)?;

  let MigrationOutcome::Completed(report) = outcome else {
    anyhow::bail!("expected a completed migration");
  };
  // Later transforms saw turbo.json staged by create-turbo-config
  assert!(
    report
      .records
      .iter()
      .any(|r| r.transform.to_string() == "set-default-outputs" && r.outcome == TransformOutcome::Success)
  );
  assert_eq!(workspace.read_file("package.json")?, before);
  assert!(!workspace.file_exists("turbo.json"));
  Ok(())
}

#[test]
fn test_second_pass_is_byte_identical() -> Result<()> {
  let workspace = TestWorkspace::from_fixture("env-mode")?;
  let host = PinnedHost::new();
  let engine = MigrationEngine::new(&host);

  engine.run(&workspace.path, &options("1.4.0", "2.0.0"))?;
  let turbo = workspace.read_json("turbo.json")?;
  assert_eq!(
    turbo,
    json!({
      "$schema": "https://turbo.build/schema.json",
      "globalDependencies": ["tsconfig.json"],
      "globalPassThroughEnv": ["AWS_SECRET_KEY"],
      "tasks": {
        "build": {
          "dependsOn": ["^build"],
          "outputs": ["dist/**"],
          "passThroughEnv": ["SENTRY_DSN"],
          "env": ["API_URL"]
        },
        "dev": { "cache": false }
      },
      "globalEnv": ["CI"]
    })
  );
  workspace.commit("First migration")?;

  let first_package = workspace.read_file("package.json")?;
  let first_turbo = workspace.read_file("turbo.json")?;

  let outcome = engine.run(&workspace.path, &options("1.4.0", "2.0.0"))?;
  let MigrationOutcome::Completed(report) = outcome else {
    anyhow::bail!("expected a completed migration");
  };
  assert!(report.applied().is_empty());
  assert_eq!(workspace.read_file("package.json")?, first_package);
  assert_eq!(workspace.read_file("turbo.json")?, first_turbo);
  Ok(())
}

#[test]
fn test_dirty_tree_aborts_before_transforms() -> Result<()> {
  let workspace = TestWorkspace::from_fixture("old-turbo")?;
  workspace.write_file("notes.txt", "wip\n")?;
  let before = workspace.read_file("package.json")?;
  let host = PinnedHost::new();

  let result = MigrationEngine::new(&host).run(&workspace.path, &options("1.0.0", "1.7.0"));
  assert!(matches!(result, Err(ToolError::DirtyWorkingTree { .. })));
  assert_eq!(workspace.read_file("package.json")?, before);
  Ok(())
}

#[test]
fn test_cli_up_to_date() -> Result<()> {
  let workspace = TestWorkspace::new(json!({ "name": "repo", "devDependencies": { "turbo": "1.7.0" } }))?;
  let output = run_turbo_tools_ok(&workspace.path, &["migrate", "--from", "1.7.0", "--to", "1.7.0"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Already up to date"), "stdout:\n{}", stdout);
  Ok(())
}

#[test]
fn test_cli_invalid_version_exits_1() -> Result<()> {
  let workspace = TestWorkspace::new(json!({ "name": "repo" }))?;
  let output = run_turbo_tools(&workspace.path, &["migrate", "--from", "banana", "--to", "1.7.0"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("banana"), "stderr:\n{}", stderr);
  Ok(())
}

#[test]
fn test_cli_missing_package_json_exits_1() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_turbo_tools(dir.path(), &["migrate", "--from", "1.0.0", "--to", "1.7.0"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  Ok(())
}
