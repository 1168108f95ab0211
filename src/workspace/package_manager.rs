//! Package manager detection, probing, and upgrade commands
//!
//! Supports every manager a turbo monorepo can use:
//! - npm (package-lock.json)
//! - pnpm (pnpm-lock.yaml, pnpm-workspace.yaml)
//! - yarn classic and berry (yarn.lock)
//! - bun (bun.lockb, bun.lock)

use crate::core::error::ToolError;
use crate::core::version;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PackageManager {
  Npm,
  Pnpm,
  Yarn,
  Bun,
}

impl PackageManager {
  pub const ALL: [PackageManager; 4] = [
    PackageManager::Npm,
    PackageManager::Pnpm,
    PackageManager::Yarn,
    PackageManager::Bun,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      PackageManager::Npm => "npm",
      PackageManager::Pnpm => "pnpm",
      PackageManager::Yarn => "yarn",
      PackageManager::Bun => "bun",
    }
  }

  /// Lockfiles written by this manager, relative to the workspace root
  pub fn lockfiles(self) -> &'static [&'static str] {
    match self {
      PackageManager::Npm => &["package-lock.json", "npm-shrinkwrap.json"],
      PackageManager::Pnpm => &["pnpm-lock.yaml"],
      PackageManager::Yarn => &["yarn.lock"],
      PackageManager::Bun => &["bun.lockb", "bun.lock"],
    }
  }

  /// Probe the installed version (`<manager> --version`), `None` if not installed
  pub fn installed_version(self) -> Option<String> {
    let binary = which::which(self.as_str()).ok()?;
    let output = Command::new(binary).arg("--version").output().ok()?;
    if !output.status.success() {
      return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let reported = stdout.trim();
    // Normalize through semver so `v1.2.3` and `1.2.3` agree
    match version::parse(reported) {
      Ok(v) => Some(v.to_string()),
      Err(_) => Some(reported.to_string()).filter(|s| !s.is_empty()),
    }
  }
}

impl fmt::Display for PackageManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for PackageManager {
  type Err = ToolError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "npm" => Ok(PackageManager::Npm),
      "pnpm" => Ok(PackageManager::Pnpm),
      "yarn" => Ok(PackageManager::Yarn),
      "bun" => Ok(PackageManager::Bun),
      other => Err(ToolError::with_help(
        format!("Unknown package manager '{}'", other),
        "Expected one of: npm, pnpm, yarn, bun",
      )),
    }
  }
}

/// Parse a `packageManager` field value such as `pnpm@8.6.0`
///
/// Corepack hashes (`yarn@3.6.1+sha256.abc`) are dropped from the version.
pub fn parse_package_manager_field(value: &str) -> Option<(PackageManager, Option<String>)> {
  let (name, rest) = match value.split_once('@') {
    Some((name, rest)) => (name, Some(rest)),
    None => (value, None),
  };
  let manager = name.parse().ok()?;
  let version = rest
    .map(|v| v.split('+').next().unwrap_or(v).trim().to_string())
    .filter(|v| !v.is_empty());
  Some((manager, version))
}

/// Detect the package manager from lockfiles and workspace config
///
/// Lockfiles are the most reliable signal and are checked first.
pub fn detect_from_files(root: &Path) -> Option<PackageManager> {
  for manager in [
    PackageManager::Bun,
    PackageManager::Pnpm,
    PackageManager::Yarn,
    PackageManager::Npm,
  ] {
    if manager.lockfiles().iter().any(|lockfile| root.join(lockfile).exists()) {
      return Some(manager);
    }
  }

  if root.join("pnpm-workspace.yaml").exists() {
    return Some(PackageManager::Pnpm);
  }
  if root.join("bunfig.toml").exists() {
    return Some(PackageManager::Bun);
  }

  None
}

/// Every known manager mapped to its installed version (`None` if missing)
pub fn available_package_managers() -> BTreeMap<PackageManager, Option<String>> {
  PackageManager::ALL
    .into_iter()
    .map(|manager| (manager, manager.installed_version()))
    .collect()
}

/// Where turbo should be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScope {
  Global,
  /// Root `devDependencies`
  Dev,
  /// Root `dependencies`
  Prod,
}

/// Command that upgrades turbo to `version` with the given manager
///
/// Returns `None` where the manager has no equivalent (global installs on
/// yarn berry). An unknown yarn version is treated as yarn classic.
pub fn upgrade_command(
  manager: PackageManager,
  manager_version: Option<&str>,
  scope: InstallScope,
  version: &str,
) -> Option<String> {
  let package = format!("turbo@{}", version);

  let command = match (manager, scope) {
    (PackageManager::Npm, InstallScope::Global) => format!("npm install {} --global", package),
    (PackageManager::Npm, InstallScope::Dev) => format!("npm install {} --save-dev", package),
    (PackageManager::Npm, InstallScope::Prod) => format!("npm install {}", package),

    (PackageManager::Pnpm, InstallScope::Global) => format!("pnpm add {} --global", package),
    (PackageManager::Pnpm, InstallScope::Dev) => format!("pnpm add {} --save-dev --workspace-root", package),
    (PackageManager::Pnpm, InstallScope::Prod) => format!("pnpm add {} --workspace-root", package),

    (PackageManager::Yarn, scope) => {
      let berry = manager_version
        .and_then(|v| version::parse(v).ok())
        .is_some_and(|v| v.major >= 2);

      match (berry, scope) {
        (true, InstallScope::Global) => return None,
        (true, InstallScope::Dev) => format!("yarn add {} --dev", package),
        (true, InstallScope::Prod) => format!("yarn add {}", package),
        (false, InstallScope::Global) => format!("yarn global add {}", package),
        (false, InstallScope::Dev) => format!("yarn add {} --dev --ignore-workspace-root-check", package),
        (false, InstallScope::Prod) => format!("yarn add {} --ignore-workspace-root-check", package),
      }
    }

    (PackageManager::Bun, InstallScope::Global) => format!("bun add {} --global", package),
    (PackageManager::Bun, InstallScope::Dev) => format!("bun add {} --dev", package),
    (PackageManager::Bun, InstallScope::Prod) => format!("bun add {}", package),
  };

  Some(command)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_parse_package_manager_field() {
    assert_eq!(
      parse_package_manager_field("pnpm@1.2.3"),
      Some((PackageManager::Pnpm, Some("1.2.3".to_string())))
    );
    assert_eq!(
      parse_package_manager_field("yarn@3.6.1+sha256.deadbeef"),
      Some((PackageManager::Yarn, Some("3.6.1".to_string())))
    );
    assert_eq!(parse_package_manager_field("npm"), Some((PackageManager::Npm, None)));
    assert_eq!(parse_package_manager_field("deno@1.0.0"), None);
  }

  #[test]
  fn test_detect_from_lockfiles() {
    let dir = TempDir::new().unwrap();
    assert_eq!(detect_from_files(dir.path()), None);

    fs::write(dir.path().join("pnpm-workspace.yaml"), "packages: []\n").unwrap();
    assert_eq!(detect_from_files(dir.path()), Some(PackageManager::Pnpm));

    fs::write(dir.path().join("yarn.lock"), "").unwrap();
    assert_eq!(detect_from_files(dir.path()), Some(PackageManager::Yarn));
  }

  #[test]
  fn test_upgrade_commands() {
    assert_eq!(
      upgrade_command(PackageManager::Npm, Some("9.0.0"), InstallScope::Global, "1.7.0").as_deref(),
      Some("npm install turbo@1.7.0 --global")
    );
    assert_eq!(
      upgrade_command(PackageManager::Pnpm, Some("8.0.0"), InstallScope::Dev, "1.7.0").as_deref(),
      Some("pnpm add turbo@1.7.0 --save-dev --workspace-root")
    );
    assert_eq!(
      upgrade_command(PackageManager::Yarn, Some("1.22.19"), InstallScope::Dev, "1.7.0").as_deref(),
      Some("yarn add turbo@1.7.0 --dev --ignore-workspace-root-check")
    );
    assert_eq!(
      upgrade_command(PackageManager::Bun, None, InstallScope::Prod, "2.0.0").as_deref(),
      Some("bun add turbo@2.0.0")
    );
  }

  #[test]
  fn test_yarn_berry_has_no_global_install() {
    assert_eq!(
      upgrade_command(PackageManager::Yarn, Some("3.6.1"), InstallScope::Global, "1.7.0"),
      None
    );
    assert_eq!(
      upgrade_command(PackageManager::Yarn, None, InstallScope::Global, "1.7.0").as_deref(),
      Some("yarn global add turbo@1.7.0")
    );
  }
}
