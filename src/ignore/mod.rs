//! Decide whether a CI build of one workspace can be skipped
//!
//! Follows the "ignored build step" convention: exit 0 skips the build,
//! exit 1 lets it proceed. Anything unexpected proceeds.

pub mod comparison;

use crate::core::error::ToolResult;
use crate::core::vcs::SystemGit;
use crate::ui;
use crate::workspace::graph::{self, AffectedReason, WorkspaceGraph};
use crate::workspace::package_manager::PackageManager;
use crate::workspace::{self as ws, PACKAGE_JSON, PNPM_WORKSPACE, TURBO_JSON, Workspace};
use comparison::{CiEnvironment, get_comparison};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Commit message tokens that force a skip
const SKIP_TOKENS: [&str; 5] = ["[skip ci]", "[ci skip]", "[no ci]", "[skip vercel]", "[vercel skip]"];

/// Commit message tokens that force a build
const DEPLOY_TOKENS: [&str; 2] = ["[vercel deploy]", "[vercel build]"];

pub const DEFAULT_TASK: &str = "build";

#[derive(Debug, Clone, Default)]
pub struct IgnoreOptions {
  /// Workspace to check; defaults to the package in the working directory
  pub workspace: Option<String>,
  /// Ref to compare against when no previous deployment is known
  pub fallback: Option<String>,
  /// Task whose `inputs` narrow which files count (default `build`)
  pub task: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreDecision {
  Skip { reason: String },
  Proceed { reason: String },
}

impl IgnoreDecision {
  fn skip(reason: impl Into<String>) -> Self {
    IgnoreDecision::Skip { reason: reason.into() }
  }

  fn proceed(reason: impl Into<String>) -> Self {
    IgnoreDecision::Proceed { reason: reason.into() }
  }

  pub fn exit_code(&self) -> i32 {
    match self {
      IgnoreDecision::Skip { .. } => 0,
      IgnoreDecision::Proceed { .. } => 1,
    }
  }

  pub fn reason(&self) -> &str {
    match self {
      IgnoreDecision::Skip { reason } | IgnoreDecision::Proceed { reason } => reason,
    }
  }
}

/// Decide for the workspace at (or named from) `cwd`; errors proceed
pub fn check(cwd: &Path, env: &CiEnvironment, options: &IgnoreOptions) -> IgnoreDecision {
  match evaluate(cwd, env, options) {
    Ok(decision) => decision,
    Err(e) => {
      log::debug!("ignore check failed: {:?}", e);
      IgnoreDecision::proceed(format!("{}", e))
    }
  }
}

fn evaluate(cwd: &Path, env: &CiEnvironment, options: &IgnoreOptions) -> ToolResult<IgnoreDecision> {
  let Some(root) = ws::find_workspace_root(cwd) else {
    return Ok(IgnoreDecision::proceed("No monorepo root found"));
  };
  let root = root.canonicalize()?;

  let Some(name) = options.workspace.clone().or_else(|| ws::package_name(cwd)) else {
    return Ok(IgnoreDecision::proceed(
      "No workspace name given and no package.json name found in the current directory",
    ));
  };
  ui::info(&format!("Checking for changes in \"{}\"", name));

  let git = SystemGit::open(&root)?;

  let commit = git.head_commit_info()?;
  if let Some(token) = find_token(&commit.message, &DEPLOY_TOKENS) {
    return Ok(IgnoreDecision::proceed(format!("Found commit message: {}", token)));
  }
  if let Some(token) = find_token(&commit.message, &SKIP_TOKENS) {
    return Ok(IgnoreDecision::skip(format!("Found commit message: {}", token)));
  }

  let Some(comparison) = get_comparison(env, &name, options.fallback.as_deref()) else {
    return Ok(IgnoreDecision::proceed("No previous deployment to compare against"));
  };

  if !git.ref_exists(&comparison.reference)? {
    ui::info(&format!(
      "Ref \"{}\" is not in this clone; a shallow clone may need more history (e.g. `git fetch --deepen=10`)",
      comparison.reference
    ));
    return Ok(IgnoreDecision::proceed(format!(
      "Unable to resolve comparison ref {} ({})",
      comparison.reference, comparison.kind
    )));
  }

  let changed = changed_files_under_root(&git, &root, &comparison.reference)?;
  log::debug!("{} files changed since {}", changed.len(), comparison.reference);

  let workspace = Workspace::load(&root)?;
  let graph = WorkspaceGraph::load(&workspace)?;
  if !graph.contains(&name) {
    return Ok(IgnoreDecision::proceed(format!(
      "Workspace \"{}\" not found in this monorepo",
      name
    )));
  }

  let task = options.task.as_deref().unwrap_or(DEFAULT_TASK);
  let globals = GlobalFiles::from_workspace(&workspace);
  let inputs = task_inputs(&workspace, &name, task);
  let relevant: Vec<PathBuf> = changed
    .into_iter()
    .filter(|file| globals.matches(file) || inputs.matches(&graph, file))
    .collect();

  let reason = graph::analyze(&graph, &name, &relevant, |file| globals.matches(file))?;

  Ok(match reason {
    Some(AffectedReason::Global { file }) => {
      IgnoreDecision::proceed(format!("Global file {} changed since {}", file.display(), comparison.reference))
    }
    Some(AffectedReason::Package { package, file }) => IgnoreDecision::proceed(format!(
      "\"{}\" changed since {} ({})",
      package,
      comparison.reference,
      file.display()
    )),
    None => IgnoreDecision::skip(format!("No changes detected for \"{}\" since {}", name, comparison.reference)),
  })
}

fn find_token<'t>(message: &str, tokens: &[&'t str]) -> Option<&'t str> {
  tokens.iter().copied().find(|token| message.contains(token))
}

/// Changed files relative to the monorepo root (which may sit below the git root)
fn changed_files_under_root(git: &SystemGit, root: &Path, reference: &str) -> ToolResult<Vec<PathBuf>> {
  let work_tree = git.work_tree().canonicalize()?;
  let files = git.changed_files_between(reference, "HEAD")?;
  Ok(
    files
      .into_iter()
      .filter_map(|file| work_tree.join(file).strip_prefix(root).ok().map(Path::to_path_buf))
      .collect(),
  )
}

/// Files that invalidate every workspace
struct GlobalFiles {
  exact: Vec<PathBuf>,
  patterns: Vec<glob::Pattern>,
}

impl GlobalFiles {
  fn from_workspace(workspace: &Workspace) -> Self {
    let mut exact: Vec<PathBuf> = [PACKAGE_JSON, TURBO_JSON, PNPM_WORKSPACE]
      .into_iter()
      .map(PathBuf::from)
      .collect();
    exact.extend(
      PackageManager::ALL
        .iter()
        .flat_map(|pm| pm.lockfiles().iter().copied())
        .map(PathBuf::from),
    );

    let patterns = string_list(workspace.turbo_json.as_ref().and_then(|t| t.get("globalDependencies")))
      .into_iter()
      .filter(|p| !p.starts_with('$'))
      .filter_map(|p| glob::Pattern::new(&p).ok())
      .collect();

    Self { exact, patterns }
  }

  fn matches(&self, file: &Path) -> bool {
    self.exact.iter().any(|f| f == file) || self.patterns.iter().any(|p| p.matches_path(file))
  }
}

/// `inputs` globs of the target task, relative to its package directory
///
/// Only files owned by the target are narrowed; changes in its
/// dependencies always count.
enum TaskInputs {
  /// No `inputs` declared: every file in the package counts
  All,
  Globs { package: String, patterns: Vec<glob::Pattern> },
}

impl TaskInputs {
  fn matches(&self, graph: &WorkspaceGraph, file: &Path) -> bool {
    match self {
      TaskInputs::All => true,
      TaskInputs::Globs { package, patterns } => {
        if graph.package_for_file(file) != Some(package.as_str()) {
          return true;
        }
        graph
          .package_dir(package)
          .and_then(|dir| file.strip_prefix(dir).ok())
          .is_some_and(|rel| patterns.iter().any(|p| p.matches_path(rel)))
      }
    }
  }
}

/// Look up `<workspace>#<task>` then `<task>` in turbo.json
fn task_inputs(workspace: &Workspace, name: &str, task: &str) -> TaskInputs {
  let Some(turbo) = &workspace.turbo_json else {
    return TaskInputs::All;
  };
  let Some(tasks) = turbo.get("tasks").or_else(|| turbo.get("pipeline")) else {
    return TaskInputs::All;
  };

  let definition = tasks
    .get(format!("{}#{}", name, task))
    .or_else(|| tasks.get(task));
  let inputs = string_list(definition.and_then(|d| d.get("inputs")));
  if inputs.is_empty() {
    return TaskInputs::All;
  }

  log::debug!("task '{}' narrows changes to inputs {:?}", task, inputs);
  TaskInputs::Globs {
    package: name.to_string(),
    patterns: inputs.iter().filter_map(|p| glob::Pattern::new(p).ok()).collect(),
  }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
  value
    .and_then(Value::as_array)
    .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::workspace::WorkspacePackage;
  use serde_json::json;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_commit_tokens() {
    assert_eq!(find_token("fix: typo [skip ci]", &SKIP_TOKENS), Some("[skip ci]"));
    assert_eq!(find_token("feat [vercel build]", &DEPLOY_TOKENS), Some("[vercel build]"));
    assert_eq!(find_token("chore: nothing", &SKIP_TOKENS), None);
  }

  #[test]
  fn test_global_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    fs::write(
      dir.path().join("turbo.json"),
      json!({ "globalDependencies": ["tsconfig.json", ".env.*", "$TOKEN"] }).to_string(),
    )
    .unwrap();

    let workspace = Workspace::load(dir.path()).unwrap();
    let globals = GlobalFiles::from_workspace(&workspace);
    assert!(globals.matches(Path::new("pnpm-lock.yaml")));
    assert!(globals.matches(Path::new("tsconfig.json")));
    assert!(globals.matches(Path::new(".env.production")));
    assert!(!globals.matches(Path::new("apps/web/package.json")));
  }

  #[test]
  fn test_task_inputs_narrow_changes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    fs::write(
      dir.path().join("turbo.json"),
      json!({ "tasks": { "web#build": { "inputs": ["src/**"] }, "build": {} } }).to_string(),
    )
    .unwrap();
    let workspace = Workspace::load(dir.path()).unwrap();
    let graph = WorkspaceGraph::from_packages(vec![
      WorkspacePackage {
        name: "web".to_string(),
        path: PathBuf::from("apps/web"),
        dependencies: vec!["ui".to_string()],
      },
      WorkspacePackage {
        name: "ui".to_string(),
        path: PathBuf::from("packages/ui"),
        dependencies: vec![],
      },
    ]);

    let inputs = task_inputs(&workspace, "web", "build");
    assert!(inputs.matches(&graph, Path::new("apps/web/src/index.ts")));
    assert!(!inputs.matches(&graph, Path::new("apps/web/README.md")));
    assert!(inputs.matches(&graph, Path::new("packages/ui/README.md")));

    assert!(matches!(task_inputs(&workspace, "docs", "build"), TaskInputs::All));
  }

  #[test]
  fn test_outside_monorepo_proceeds() {
    let dir = TempDir::new().unwrap();
    let decision = check(dir.path(), &CiEnvironment::default(), &IgnoreOptions::default());
    assert_eq!(decision.exit_code(), 1);
  }
}
