//! Scaffold a new monorepo
//!
//! ## Steps
//!
//! 1. Validate the target directory (missing or empty)
//! 2. Pick a package manager (flag, prompt, or npm)
//! 3. Copy the template (`--example` directory or the built-in starter)
//! 4. Run the create transforms through a `FileStage`
//! 5. `git init` and an initial commit, best effort
//! 6. Install dependencies unless skipped

pub mod starter;
pub mod transforms;

use crate::core::error::{ResultExt, ToolError, ToolResult};
use crate::core::stage::FileStage;
use crate::core::vcs::SystemGit;
use crate::migrate::transforms::TransformOutcome;
use crate::ui;
use crate::workspace::PackageManagerInfo;
use crate::workspace::package_manager::{self, PackageManager};
use std::collections::BTreeMap;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::Command;
use transforms::{CreateContext, CreateTransform};
use walkdir::WalkDir;

/// Entries an otherwise empty target directory may already contain
const IGNORED_ENTRIES: [&str; 2] = [".git", ".DS_Store"];

/// Directories never copied from a local example
const SKIPPED_DIRS: [&str; 3] = [".git", "node_modules", ".turbo"];

const INITIAL_COMMIT_MESSAGE: &str = "Initial commit from turbo-tools create";

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
  pub directory: PathBuf,
  pub package_manager: Option<PackageManager>,
  /// Local starter directory to copy instead of the built-in one
  pub example: Option<PathBuf>,
  pub turbo_version: Option<String>,
  pub skip_install: bool,
  pub skip_transforms: bool,
}

/// Where the project files come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
  Builtin,
  Local(PathBuf),
}

/// Validated target directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDir {
  pub root: PathBuf,
  /// Base name of `root`, used as the package name
  pub name: String,
}

#[derive(Debug)]
pub struct CreateReport {
  pub project: ProjectDir,
  pub package_manager: Option<PackageManagerInfo>,
  pub transforms: Vec<(CreateTransform, TransformOutcome)>,
  pub git_initialized: bool,
  /// Install command that ran successfully
  pub installed: Option<String>,
}

/// Check that `path` can receive a new project
pub fn validate_directory(path: &Path) -> ToolResult<ProjectDir> {
  let root = std::path::absolute(path).with_context(|| format!("Failed to resolve {}", path.display()))?;

  if root.exists() && !root.is_dir() {
    return Err(ToolError::InvalidDirectory {
      path: root,
      reason: "a file with this name already exists".to_string(),
    });
  }

  if root.is_dir() {
    let conflicts: Vec<String> = fs::read_dir(&root)
      .with_context(|| format!("Failed to read {}", root.display()))?
      .filter_map(Result::ok)
      .map(|entry| entry.file_name().to_string_lossy().to_string())
      .filter(|name| !IGNORED_ENTRIES.contains(&name.as_str()))
      .collect();
    if !conflicts.is_empty() {
      return Err(ToolError::InvalidDirectory {
        path: root,
        reason: format!("directory is not empty (found {})", conflicts.join(", ")),
      });
    }
  }

  let name = root
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .ok_or_else(|| ToolError::InvalidDirectory {
      path: root.clone(),
      reason: "cannot derive a project name from this path".to_string(),
    })?;

  Ok(ProjectDir { root, name })
}

/// Outcome of matching the requested manager against what is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerChoice {
  Chosen(PackageManagerInfo),
  /// Ask the user to pick among these
  Ask(Vec<PackageManagerInfo>),
}

/// Decide on a package manager without prompting
///
/// A requested manager is used when installed; npm is always allowed.
pub fn choose_package_manager(
  requested: Option<PackageManager>,
  available: &BTreeMap<PackageManager, Option<String>>,
) -> ManagerChoice {
  let info = |name: PackageManager| PackageManagerInfo {
    name,
    version: available.get(&name).cloned().flatten(),
  };

  if let Some(requested) = requested {
    let installed = available.get(&requested).is_some_and(Option::is_some);
    if installed || requested == PackageManager::Npm {
      return ManagerChoice::Chosen(info(requested));
    }
    ui::warn(&format!("{} is not installed", requested));
  }

  let installed: Vec<PackageManagerInfo> = available
    .iter()
    .filter(|(_, version)| version.is_some())
    .map(|(name, _)| info(*name))
    .collect();

  if installed.is_empty() {
    ManagerChoice::Chosen(info(PackageManager::Npm))
  } else {
    ManagerChoice::Ask(installed)
  }
}

fn select_package_manager(requested: Option<PackageManager>) -> ToolResult<PackageManagerInfo> {
  let available = package_manager::available_package_managers();
  match choose_package_manager(requested, &available) {
    ManagerChoice::Chosen(info) => Ok(info),
    ManagerChoice::Ask(options) => {
      if !(std::io::stdin().is_terminal() && std::io::stdout().is_terminal()) {
        log::debug!("not a terminal, defaulting to npm");
        return Ok(PackageManagerInfo {
          name: PackageManager::Npm,
          version: available.get(&PackageManager::Npm).cloned().flatten(),
        });
      }
      let labels: Vec<String> = options.iter().map(|o| o.name.to_string()).collect();
      let selected = inquire::Select::new("Which package manager do you want to use?", labels)
        .prompt()
        .map_err(|e| ToolError::message(format!("Prompt cancelled: {}", e)))?;
      options
        .into_iter()
        .find(|o| o.name.as_str() == selected)
        .ok_or_else(|| ToolError::message(format!("Unknown package manager '{}'", selected)))
    }
  }
}

/// Scaffold a project according to `options`
pub fn create(options: &CreateOptions) -> ToolResult<CreateReport> {
  let project = validate_directory(&options.directory)?;

  let template = match &options.example {
    Some(path) if path.is_dir() => Template::Local(path.clone()),
    Some(path) => {
      return Err(ToolError::InvalidDirectory {
        path: path.clone(),
        reason: "example is not a directory".to_string(),
      });
    }
    None => Template::Builtin,
  };

  let package_manager = if options.skip_transforms {
    None
  } else {
    Some(select_package_manager(options.package_manager)?)
  };

  println!("🚀 Creating a new monorepo in {}", project.root.display());
  fs::create_dir_all(&project.root).with_context(|| format!("Failed to create {}", project.root.display()))?;

  let copied = match &template {
    Template::Builtin => starter::write_starter(&project.root)?,
    Template::Local(source) => copy_template(source, &project.root)?,
  };
  log::debug!("copied {} template files", copied.len());

  let transforms = if options.skip_transforms {
    Vec::new()
  } else {
    run_transforms(&project, &template, package_manager.as_ref(), options.turbo_version.as_deref())?
  };

  let git_initialized = init_git(&project.root);

  let installed = if options.skip_install {
    None
  } else {
    let manager = package_manager
      .as_ref()
      .map(|m| m.name)
      .or_else(|| package_manager::detect_from_files(&project.root))
      .unwrap_or(PackageManager::Npm);
    install(&project.root, manager)
  };

  Ok(CreateReport {
    project,
    package_manager,
    transforms,
    git_initialized,
    installed,
  })
}

/// Copy a local starter, skipping VCS metadata, dependencies and caches
fn copy_template(source: &Path, dest: &Path) -> ToolResult<Vec<PathBuf>> {
  let mut copied = Vec::new();
  let walker = WalkDir::new(source).into_iter().filter_entry(|entry| {
    entry.depth() == 0 || !(entry.file_type().is_dir() && SKIPPED_DIRS.iter().any(|d| entry.file_name() == *d))
  });

  for entry in walker {
    let entry = entry?;
    let rel = entry.path().strip_prefix(source)?;
    let target = dest.join(rel);
    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).with_context(|| format!("Failed to create {}", target.display()))?;
    } else if entry.file_type().is_file() {
      fs::copy(entry.path(), &target).with_context(|| format!("Failed to copy {}", rel.display()))?;
      copied.push(rel.to_path_buf());
    }
  }

  Ok(copied)
}

fn run_transforms(
  project: &ProjectDir,
  template: &Template,
  package_manager: Option<&PackageManagerInfo>,
  turbo_version: Option<&str>,
) -> ToolResult<Vec<(CreateTransform, TransformOutcome)>> {
  let mut stage = FileStage::new(&project.root);
  let mut results: Vec<(CreateTransform, TransformOutcome)> = Vec::with_capacity(CreateTransform::ALL.len());

  for transform in CreateTransform::ALL {
    let outcome = transform.apply(&mut CreateContext {
      root: &project.root,
      project_name: &project.name,
      template,
      package_manager,
      turbo_version,
      stage: &mut stage,
    });
    log::debug!("{}: {}", transform, outcome);

    if outcome.is_fatal() {
      stage.discard();
      let message = match &outcome {
        TransformOutcome::Error { message, .. } => message.clone(),
        _ => outcome.to_string(),
      };
      return Err(ToolError::TransformFatal {
        transform: transform.name().to_string(),
        message,
        applied: results.iter().map(|(t, _)| t.name().to_string()).collect(),
      });
    }

    stage.commit()?;
    results.push((transform, outcome));
  }

  Ok(results)
}

/// `git init` plus an initial commit; skipped inside an existing repository
fn init_git(root: &Path) -> bool {
  if SystemGit::open(root).is_ok() {
    log::debug!("{} is already inside a git repository", root.display());
    return false;
  }

  let result = SystemGit::init(root).and_then(|git| git.commit_all(INITIAL_COMMIT_MESSAGE));
  match result {
    Ok(()) => true,
    Err(e) => {
      ui::warn(&format!("Unable to initialize a git repository: {}", e));
      false
    }
  }
}

/// `<pm> install` in the new project; failures only warn
fn install(root: &Path, manager: PackageManager) -> Option<String> {
  let command = format!("{} install", manager);
  println!("📦 Installing dependencies with {}...", manager);

  let program = which::which(manager.as_str()).unwrap_or_else(|_| PathBuf::from(manager.as_str()));
  match Command::new(program).arg("install").current_dir(root).status() {
    Ok(status) if status.success() => Some(command),
    Ok(status) => {
      ui::warn(&format!("`{}` exited with {}", command, status));
      None
    }
    Err(e) => {
      ui::warn(&format!("Failed to run `{}`: {}", command, e));
      None
    }
  }
}
