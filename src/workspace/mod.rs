//! Node monorepo workspace model
//!
//! Supports the workspace layouts turbo runs on:
//! - npm / yarn / bun workspaces (package.json with "workspaces")
//! - pnpm workspaces (pnpm-workspace.yaml)

pub mod graph;
pub mod package_manager;

use crate::core::error::{ResultExt, ToolError, ToolResult};
use crate::core::version;
use package_manager::{InstallScope, PackageManager};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const PACKAGE_JSON: &str = "package.json";
pub const TURBO_JSON: &str = "turbo.json";
pub const PNPM_WORKSPACE: &str = "pnpm-workspace.yaml";

/// Detected package manager and, when known, its version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManagerInfo {
  pub name: PackageManager,
  pub version: Option<String>,
}

impl fmt::Display for PackageManagerInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.version {
      Some(version) => write!(f, "{}@{}", self.name, version),
      None => write!(f, "{}", self.name),
    }
  }
}

/// Resolved metadata about a repository, owned by one run
#[derive(Debug, Clone)]
pub struct Workspace {
  pub root: PathBuf,
  pub package_manager: Option<PackageManagerInfo>,
  /// Root package.json document
  pub package_json: Value,
  /// Root turbo.json document, if present
  pub turbo_json: Option<Value>,
}

/// package.json structure (minimal fields we care about)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  workspaces: Option<WorkspaceSpec>,
  #[serde(default)]
  dependencies: BTreeMap<String, Value>,
  #[serde(default)]
  dev_dependencies: BTreeMap<String, Value>,
  #[serde(default)]
  peer_dependencies: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspaceSpec {
  Array(Vec<String>),
  Object {
    #[serde(default)]
    packages: Vec<String>,
  },
}

impl WorkspaceSpec {
  fn patterns(&self) -> &[String] {
    match self {
      WorkspaceSpec::Array(patterns) => patterns,
      WorkspaceSpec::Object { packages } => packages,
    }
  }
}

#[derive(Debug, Deserialize)]
struct PnpmWorkspace {
  #[serde(default)]
  packages: Vec<String>,
}

/// A member package of the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePackage {
  pub name: String,
  /// Directory relative to the workspace root
  pub path: PathBuf,
  /// Names of every declared dependency (prod, dev, peer)
  pub dependencies: Vec<String>,
}

impl Workspace {
  /// Load workspace metadata from a root directory
  ///
  /// The package manager comes from the `packageManager` field when present,
  /// otherwise from lockfiles. Its version is only known from the field;
  /// callers that need it probe the installed binary.
  pub fn load(root: &Path) -> ToolResult<Self> {
    if !root.is_dir() {
      return Err(ToolError::InvalidDirectory {
        path: root.to_path_buf(),
        reason: "not a directory".to_string(),
      });
    }

    let package_json_path = root.join(PACKAGE_JSON);
    if !package_json_path.is_file() {
      return Err(ToolError::InvalidDirectory {
        path: root.to_path_buf(),
        reason: "no package.json found".to_string(),
      });
    }

    let package_json = read_json(&package_json_path)?;
    let turbo_json_path = root.join(TURBO_JSON);
    let turbo_json = if turbo_json_path.is_file() {
      Some(read_json(&turbo_json_path)?)
    } else {
      None
    };

    let package_manager = package_json
      .get("packageManager")
      .and_then(Value::as_str)
      .and_then(package_manager::parse_package_manager_field)
      .map(|(name, version)| PackageManagerInfo { name, version })
      .or_else(|| {
        package_manager::detect_from_files(root).map(|name| PackageManagerInfo { name, version: None })
      });

    log::debug!(
      "loaded workspace at {} (package manager: {})",
      root.display(),
      package_manager
        .as_ref()
        .map(|pm| pm.to_string())
        .unwrap_or_else(|| "unknown".to_string())
    );

    Ok(Self {
      root: root.to_path_buf(),
      package_manager,
      package_json,
      turbo_json,
    })
  }

  /// The `turbo` dependency declared in root package.json and where it lives
  pub fn declared_turbo(&self) -> Option<(InstallScope, &str)> {
    let lookup = |field: &str| {
      self
        .package_json
        .get(field)
        .and_then(|deps| deps.get("turbo"))
        .and_then(Value::as_str)
    };

    lookup("devDependencies")
      .map(|spec| (InstallScope::Dev, spec))
      .or_else(|| lookup("dependencies").map(|spec| (InstallScope::Prod, spec)))
  }

  /// Local when root package.json declares turbo, global otherwise
  pub fn install_scope(&self) -> InstallScope {
    self
      .declared_turbo()
      .map(|(scope, _)| scope)
      .unwrap_or(InstallScope::Global)
  }

  /// Version pinned by the declared turbo dependency, if it pins one
  pub fn declared_turbo_version(&self) -> Option<semver::Version> {
    self
      .declared_turbo()
      .and_then(|(_, spec)| version::from_dependency_spec(spec))
  }

  /// Workspace glob patterns (pnpm-workspace.yaml first, then package.json)
  pub fn workspace_patterns(&self) -> ToolResult<Vec<String>> {
    let pnpm_workspace = self.root.join(PNPM_WORKSPACE);
    if pnpm_workspace.is_file() {
      let content = fs::read_to_string(&pnpm_workspace).context("Failed to read pnpm-workspace.yaml")?;
      let parsed: PnpmWorkspace = serde_yaml::from_str(&content).context("Failed to parse pnpm-workspace.yaml")?;
      return Ok(parsed.packages);
    }

    let pkg: PackageJson = serde_json::from_value(self.package_json.clone()).unwrap_or_default();
    Ok(pkg.workspaces.map(|w| w.patterns().to_vec()).unwrap_or_default())
  }

  /// Discover member packages by expanding the workspace patterns
  ///
  /// Patterns prefixed with `!` exclude matches. Members without a `name`
  /// or with an unreadable package.json are skipped.
  pub fn packages(&self) -> ToolResult<Vec<WorkspacePackage>> {
    let patterns = self.workspace_patterns()?;
    let (excludes, includes): (Vec<_>, Vec<_>) = patterns.iter().partition(|p| p.starts_with('!'));

    let excludes: Vec<glob::Pattern> = excludes
      .iter()
      .filter_map(|p| glob::Pattern::new(p.trim_start_matches('!').trim_end_matches('/')).ok())
      .collect();

    let mut packages: BTreeMap<PathBuf, WorkspacePackage> = BTreeMap::new();

    for pattern in includes {
      let manifest_glob = self
        .root
        .join(pattern.trim_end_matches('/'))
        .join(PACKAGE_JSON)
        .display()
        .to_string();

      let entries =
        glob::glob(&manifest_glob).map_err(|e| ToolError::message(format!("Invalid workspace pattern '{}': {}", pattern, e)))?;

      for manifest in entries.flatten() {
        if manifest.components().any(|c| c.as_os_str() == "node_modules") {
          continue;
        }
        let Some(dir) = manifest.parent() else { continue };
        let rel = dir.strip_prefix(&self.root)?.to_path_buf();
        if excludes.iter().any(|ex| ex.matches_path(&rel)) {
          continue;
        }

        match load_package(&manifest, rel.clone()) {
          Ok(Some(pkg)) => {
            packages.insert(rel, pkg);
          }
          Ok(None) => log::debug!("skipping unnamed package at {}", rel.display()),
          Err(e) => log::warn!("skipping {}: {}", manifest.display(), e),
        }
      }
    }

    Ok(packages.into_values().collect())
  }
}

/// Nearest ancestor of `start` (inclusive) that is a monorepo root
///
/// A root has turbo.json, pnpm-workspace.yaml, or a package.json with a
/// `workspaces` field.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
  start.ancestors().find(|dir| is_workspace_root(dir)).map(Path::to_path_buf)
}

fn is_workspace_root(dir: &Path) -> bool {
  if dir.join(TURBO_JSON).is_file() || dir.join(PNPM_WORKSPACE).is_file() {
    return true;
  }

  fs::read_to_string(dir.join(PACKAGE_JSON))
    .ok()
    .and_then(|content| serde_json::from_str::<PackageJson>(&content).ok())
    .is_some_and(|pkg| pkg.workspaces.is_some())
}

/// `name` field of the package.json in `dir`
pub fn package_name(dir: &Path) -> Option<String> {
  let content = fs::read_to_string(dir.join(PACKAGE_JSON)).ok()?;
  serde_json::from_str::<PackageJson>(&content).ok()?.name
}

fn load_package(manifest: &Path, rel: PathBuf) -> ToolResult<Option<WorkspacePackage>> {
  let content = fs::read_to_string(manifest)?;
  let pkg: PackageJson = serde_json::from_str(&content)?;

  let Some(name) = pkg.name else {
    return Ok(None);
  };

  let mut dependencies: Vec<String> = pkg
    .dependencies
    .into_keys()
    .chain(pkg.dev_dependencies.into_keys())
    .chain(pkg.peer_dependencies.into_keys())
    .collect();
  dependencies.sort();
  dependencies.dedup();

  Ok(Some(WorkspacePackage {
    name,
    path: rel,
    dependencies,
  }))
}

fn read_json(path: &Path) -> ToolResult<Value> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn test_load_requires_package_json() {
    let dir = TempDir::new().unwrap();
    let err = Workspace::load(dir.path()).unwrap_err();
    assert!(matches!(err, ToolError::InvalidDirectory { .. }));

    let err = Workspace::load(&dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, ToolError::InvalidDirectory { .. }));
  }

  #[test]
  fn test_package_manager_field_wins_over_lockfile() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "package.json", r#"{ "packageManager": "pnpm@8.6.0" }"#);
    write(dir.path(), "yarn.lock", "");

    let ws = Workspace::load(dir.path()).unwrap();
    assert_eq!(
      ws.package_manager,
      Some(PackageManagerInfo {
        name: PackageManager::Pnpm,
        version: Some("8.6.0".to_string())
      })
    );
  }

  #[test]
  fn test_install_scope_follows_declaration() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "package.json", r#"{ "devDependencies": { "turbo": "^1.2.0" } }"#);
    let ws = Workspace::load(dir.path()).unwrap();
    assert_eq!(ws.install_scope(), InstallScope::Dev);
    assert_eq!(ws.declared_turbo_version(), Some(semver::Version::new(1, 2, 0)));

    write(dir.path(), "package.json", r#"{ "name": "root" }"#);
    let ws = Workspace::load(dir.path()).unwrap();
    assert_eq!(ws.install_scope(), InstallScope::Global);
  }

  #[test]
  fn test_discover_packages_npm_and_pnpm() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "package.json", r#"{ "workspaces": ["apps/*", "packages/*", "!packages/skip"] }"#);
    write(root, "apps/web/package.json", r#"{ "name": "web", "dependencies": { "ui": "*" } }"#);
    write(root, "packages/ui/package.json", r#"{ "name": "ui" }"#);
    write(root, "packages/skip/package.json", r#"{ "name": "skip" }"#);

    let ws = Workspace::load(root).unwrap();
    let names: Vec<_> = ws.packages().unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["web", "ui"]);

    write(root, "pnpm-workspace.yaml", "packages:\n  - \"packages/*\"\n");
    let names: Vec<_> = ws.packages().unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["skip", "ui"]);
  }

  #[test]
  fn test_find_workspace_root_walks_up() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "turbo.json", "{}");
    write(root, "apps/web/package.json", r#"{ "name": "web" }"#);

    let found = find_workspace_root(&root.join("apps/web")).unwrap();
    assert_eq!(found, root);
    assert_eq!(package_name(&root.join("apps/web")).as_deref(), Some("web"));
  }
}
