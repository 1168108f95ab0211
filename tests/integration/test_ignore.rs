//! Integration tests for `ignore`

use crate::helpers::*;
use anyhow::Result;
use serde_json::json;

/// web → ui, docs standalone
fn monorepo() -> Result<TestWorkspace> {
  let workspace = TestWorkspace::new(json!({
    "name": "root",
    "private": true,
    "workspaces": ["apps/*", "packages/*"]
  }))?;
  workspace.write_json("turbo.json", &json!({ "tasks": { "build": {} } }))?;
  workspace.add_package("apps/web", "web", &["ui"])?;
  workspace.add_package("apps/docs", "docs", &[])?;
  workspace.add_package("packages/ui", "ui", &[])?;
  workspace.commit("Add packages")?;
  Ok(workspace)
}

fn exit_code(workspace: &TestWorkspace, args: &[&str], env: &[(&str, &str)]) -> Result<Option<i32>> {
  let mut full = vec!["ignore"];
  full.extend_from_slice(args);
  Ok(run_turbo_tools(&workspace.path, &full, env)?.status.code())
}

#[test]
fn test_unrelated_change_skips() -> Result<()> {
  let workspace = monorepo()?;
  workspace.write_file("apps/docs/index.js", "module.exports = 1;\n")?;
  workspace.commit("Change docs")?;

  assert_eq!(exit_code(&workspace, &["web"], &[])?, Some(0));
  assert_eq!(exit_code(&workspace, &["docs"], &[])?, Some(1));
  Ok(())
}

#[test]
fn test_dependency_change_proceeds() -> Result<()> {
  let workspace = monorepo()?;
  workspace.write_file("packages/ui/index.js", "module.exports = 2;\n")?;
  workspace.commit("Change ui")?;

  assert_eq!(exit_code(&workspace, &["web"], &[])?, Some(1));
  assert_eq!(exit_code(&workspace, &["docs"], &[])?, Some(0));
  Ok(())
}

#[test]
fn test_global_change_proceeds() -> Result<()> {
  let workspace = monorepo()?;
  workspace.write_json("turbo.json", &json!({ "tasks": { "build": { "outputs": ["dist/**"] } } }))?;
  workspace.commit("Change turbo.json")?;

  assert_eq!(exit_code(&workspace, &["docs"], &[])?, Some(1));
  Ok(())
}

#[test]
fn test_commit_message_tokens() -> Result<()> {
  let workspace = monorepo()?;
  workspace.write_file("apps/web/index.js", "module.exports = 3;\n")?;
  workspace.commit("Change web [skip ci]")?;
  assert_eq!(exit_code(&workspace, &["web"], &[])?, Some(0));

  workspace.commit("Force a build [vercel build]")?;
  assert_eq!(exit_code(&workspace, &["docs"], &[])?, Some(1));
  Ok(())
}

#[test]
fn test_workspace_name_from_cwd() -> Result<()> {
  let workspace = monorepo()?;
  workspace.write_file("apps/web/index.js", "module.exports = 4;\n")?;
  workspace.commit("Change web")?;

  let output = run_turbo_tools(&workspace.path.join("apps/web"), &["ignore"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("\"web\""), "stdout:\n{}", stdout);
  Ok(())
}

#[test]
fn test_previous_deploy_comparison() -> Result<()> {
  let workspace = monorepo()?;
  let deployed = workspace.commit("Deployed")?;
  workspace.write_file("packages/ui/index.js", "module.exports = 5;\n")?;
  workspace.commit("Change ui")?;
  workspace.write_file("apps/docs/index.js", "module.exports = 6;\n")?;
  workspace.commit("Change docs")?;

  // HEAD^ only sees the docs change; the previous deploy also sees ui
  assert_eq!(exit_code(&workspace, &["web"], &[])?, Some(0));
  let vercel = [("VERCEL", "1"), ("VERCEL_GIT_PREVIOUS_SHA", deployed.as_str())];
  assert_eq!(exit_code(&workspace, &["web"], &vercel)?, Some(1));
  Ok(())
}

#[test]
fn test_vercel_without_previous_deploy_proceeds() -> Result<()> {
  let workspace = monorepo()?;
  workspace.commit("Empty")?;
  assert_eq!(exit_code(&workspace, &["docs"], &[("VERCEL", "1")])?, Some(1));
  assert_eq!(
    exit_code(&workspace, &["docs", "--fallback", "HEAD^"], &[("VERCEL", "1")])?,
    Some(0)
  );
  Ok(())
}

#[test]
fn test_unknown_ref_proceeds() -> Result<()> {
  let workspace = monorepo()?;
  assert_eq!(exit_code(&workspace, &["web", "--fallback", "no-such-ref"], &[])?, Some(1));
  Ok(())
}

#[test]
fn test_task_inputs_narrow_changes() -> Result<()> {
  let workspace = monorepo()?;
  workspace.write_json(
    "turbo.json",
    &json!({ "tasks": { "build": {}, "web#build": { "inputs": ["src/**"] } } }),
  )?;
  workspace.commit("Narrow web inputs")?;
  workspace.write_file("apps/web/README.md", "docs only\n")?;
  workspace.commit("Docs for web")?;

  assert_eq!(exit_code(&workspace, &["web"], &[])?, Some(0));

  workspace.write_file("apps/web/src/app.js", "module.exports = 7;\n")?;
  workspace.commit("Change web source")?;
  assert_eq!(exit_code(&workspace, &["web"], &[])?, Some(1));
  Ok(())
}
