//! Collaborators the migration engine depends on
//!
//! The engine never shells out or touches the network itself. Everything
//! environment-dependent goes through `MigrationHost`, so tests substitute a
//! fake and production uses `SystemHost`.

use crate::core::config::RegistryConfig;
use crate::core::error::{ResultExt, ToolError, ToolResult};
use crate::core::vcs::SystemGit;
use crate::core::version;
use crate::workspace::{Workspace, package_manager};
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// State of the repository's working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitStatus {
  Clean,
  Dirty,
}

pub trait MigrationHost {
  /// Working tree status; `NotAGitRepository` outside a repository
  fn git_status(&self, root: &Path) -> ToolResult<GitStatus>;

  /// Workspace metadata, including the package manager version
  fn workspace_details(&self, root: &Path) -> ToolResult<Workspace>;

  /// Installed turbo version, `None` if it cannot be determined
  fn current_version(&self, workspace: &Workspace) -> ToolResult<Option<String>>;

  /// Latest published turbo version
  fn latest_version(&self) -> ToolResult<Option<String>>;

  /// Command that upgrades turbo to `target`
  fn upgrade_command(&self, workspace: &Workspace, target: &Version) -> Option<String> {
    let manager = workspace.package_manager.as_ref()?;
    package_manager::upgrade_command(
      manager.name,
      manager.version.as_deref(),
      workspace.install_scope(),
      &target.to_string(),
    )
  }

  /// Stop the turbo daemon before upgrading; failures are ignored
  fn stop_daemon(&self, root: &Path);

  /// Run the upgrade command; non-zero exit is `InstallCommandFailed`
  fn run_install(&self, root: &Path, command: &str) -> ToolResult<()>;
}

/// Production host: system git, local binaries, npm registry
pub struct SystemHost {
  registry: RegistryConfig,
}

impl SystemHost {
  pub fn new(registry: RegistryConfig) -> Self {
    Self { registry }
  }
}

impl MigrationHost for SystemHost {
  fn git_status(&self, root: &Path) -> ToolResult<GitStatus> {
    let git = SystemGit::open(root)?;
    if git.is_clean()? {
      Ok(GitStatus::Clean)
    } else {
      Ok(GitStatus::Dirty)
    }
  }

  fn workspace_details(&self, root: &Path) -> ToolResult<Workspace> {
    let mut workspace = Workspace::load(root)?;
    if let Some(manager) = workspace.package_manager.as_mut()
      && manager.version.is_none()
    {
      manager.version = manager.name.installed_version();
      log::debug!("probed {} version: {:?}", manager.name, manager.version);
    }
    Ok(workspace)
  }

  fn current_version(&self, workspace: &Workspace) -> ToolResult<Option<String>> {
    if let Some(binary) = turbo_binary(&workspace.root)
      && let Ok(output) = Command::new(&binary).arg("--version").current_dir(&workspace.root).output()
      && output.status.success()
    {
      let stdout = String::from_utf8_lossy(&output.stdout);
      // turbo may print warnings before the version
      if let Some(v) = stdout.lines().rev().find_map(|line| version::parse(line).ok()) {
        log::debug!("{} --version reported {}", binary.display(), v);
        return Ok(Some(v.to_string()));
      }
    }

    let declared = workspace.declared_turbo_version().map(|v| v.to_string());
    if let Some(v) = &declared {
      log::debug!("using turbo version {} declared in package.json", v);
    }
    Ok(declared)
  }

  fn latest_version(&self) -> ToolResult<Option<String>> {
    fetch_latest_version(&self.registry, "turbo")
  }

  fn stop_daemon(&self, root: &Path) {
    let Some(binary) = turbo_binary(root) else {
      return;
    };
    match Command::new(binary).args(["daemon", "stop"]).current_dir(root).output() {
      Ok(output) if output.status.success() => log::debug!("stopped turbo daemon"),
      Ok(output) => log::debug!("turbo daemon stop exited with {}", output.status),
      Err(e) => log::debug!("failed to run turbo daemon stop: {}", e),
    }
  }

  fn run_install(&self, root: &Path, command: &str) -> ToolResult<()> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
      return Err(ToolError::message("Empty install command"));
    };
    let program = which::which(program).unwrap_or_else(|_| PathBuf::from(program));

    let output = Command::new(program)
      .args(parts)
      .current_dir(root)
      .output()
      .with_context(|| format!("Failed to run {}", command))?;

    if !output.status.success() {
      return Err(ToolError::InstallCommandFailed {
        command: command.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }
}

/// Local `node_modules/.bin/turbo`, else `turbo` on PATH
fn turbo_binary(root: &Path) -> Option<PathBuf> {
  let local = root.join("node_modules").join(".bin").join("turbo");
  if local.is_file() {
    return Some(local);
  }
  which::which("turbo").ok()
}

#[derive(Debug, Deserialize)]
struct PackageMetadata {
  #[serde(rename = "dist-tags", default)]
  dist_tags: BTreeMap<String, String>,
}

/// `dist-tags.latest` of a package on the configured registry
///
/// One request bounded by the configured timeout; no retry.
pub fn fetch_latest_version(registry: &RegistryConfig, package: &str) -> ToolResult<Option<String>> {
  let url = registry.package_url(package);
  log::debug!("GET {}", url);

  let agent: ureq::Agent = ureq::Agent::config_builder()
    .timeout_global(Some(registry.timeout()))
    .build()
    .into();

  let metadata: PackageMetadata = agent
    .get(&url)
    .header("Accept", "application/vnd.npm.install-v1+json")
    .call()?
    .into_body()
    .read_json()?;

  Ok(metadata.dist_tags.get("latest").cloned())
}
