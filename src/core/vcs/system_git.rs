//! System git backend
//!
//! Every operation shells out to `git -C <repo>` with an isolated
//! environment, so user config cannot change the output we parse.

use crate::core::error::{GitError, ResultExt, ToolError, ToolResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git
#[derive(Debug, Clone)]
pub struct SystemGit {
  /// Directory commands run in
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the repository containing `path`
  ///
  /// Fails with `NotAGitRepository` when `path` is outside any work tree.
  pub fn open(path: &Path) -> ToolResult<Self> {
    let output = isolated_git()
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ToolError::NotAGitRepository {
          path: path.to_path_buf(),
        });
      }
      return Err(ToolError::message(format!("Failed to open git repository: {}", stderr.trim())));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Initialize a new repository at `path` and open it
  pub fn init(path: &Path) -> ToolResult<Self> {
    let output = isolated_git()
      .arg("-C")
      .arg(path)
      .args(["init", "--quiet"])
      .output()
      .context("Failed to execute git init")?;

    if !output.status.success() {
      return Err(ToolError::Git(GitError::CommandFailed {
        command: "git init".to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Self::open(path)
  }

  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> ToolResult<String> {
    let output = self.run(&["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run a git command and fail on non-zero exit
  pub(crate) fn run(&self, args: &[&str]) -> ToolResult<Output> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      return Err(ToolError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(output)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = isolated_git();
    cmd.arg("-C").arg(&self.repo_path);
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
    cmd
  }
}

/// `git` with a cleared environment (PATH and HOME only)
fn isolated_git() -> Command {
  let mut cmd = Command::new("git");
  cmd.env_clear();
  if let Ok(path) = std::env::var("PATH") {
    cmd.env("PATH", path);
  }
  if let Ok(home) = std::env::var("HOME") {
    cmd.env("HOME", home);
  }
  cmd
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_open_outside_repository() {
    let dir = TempDir::new().unwrap();
    let err = SystemGit::open(dir.path()).unwrap_err();
    assert!(matches!(err, ToolError::NotAGitRepository { .. }));
  }

  #[test]
  fn test_init_then_open() {
    let dir = TempDir::new().unwrap();
    let git = SystemGit::init(dir.path()).unwrap();
    assert_eq!(
      git.work_tree().canonicalize().unwrap(),
      dir.path().canonicalize().unwrap()
    );
  }
}
