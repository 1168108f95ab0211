//! Additional operations for SystemGit (status, refs, diffs, commits)

use super::CommitInfo;
use super::system_git::SystemGit;
use crate::core::error::{GitError, ResultExt, ToolError, ToolResult};
use std::path::PathBuf;

impl SystemGit {
  /// Whether the working tree has no uncommitted or untracked changes
  pub fn is_clean(&self) -> ToolResult<bool> {
    let output = self.run(&["status", "--porcelain"])?;
    Ok(output.stdout.iter().all(|b| b.is_ascii_whitespace()))
  }

  /// SHA and full message of HEAD
  pub fn head_commit_info(&self) -> ToolResult<CommitInfo> {
    let output = self.run(&["log", "-1", "--format=%H%n%B", "HEAD"])?;
    let text = String::from_utf8(output.stdout)?;
    let (sha, message) = text.split_once('\n').unwrap_or((text.as_str(), ""));

    Ok(CommitInfo {
      sha: sha.trim().to_string(),
      message: message.trim_end().to_string(),
    })
  }

  /// Whether `reference` resolves to an object in this repository
  ///
  /// Shallow clones commonly lack the comparison commit, so callers check
  /// this before diffing.
  pub fn ref_exists(&self, reference: &str) -> ToolResult<bool> {
    let output = self
      .git_cmd()
      .args(["cat-file", "-t", reference])
      .output()
      .context("Failed to execute git cat-file")?;
    Ok(output.status.success())
  }

  /// Files changed between `from` and `to`, relative to the work tree root
  pub fn changed_files_between(&self, from: &str, to: &str) -> ToolResult<Vec<PathBuf>> {
    if !self.ref_exists(from)? {
      return Err(ToolError::Git(GitError::RefNotFound {
        reference: from.to_string(),
      }));
    }

    let output = self.run(&["diff", "--name-only", from, to])?;
    let files = String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(PathBuf::from)
      .collect();

    Ok(files)
  }

  /// Stage everything and create a commit
  pub fn commit_all(&self, message: &str) -> ToolResult<()> {
    self.run(&["add", "-A"])?;
    self.run(&["commit", "--quiet", "--no-verify", "-m", message])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn repo() -> (TempDir, SystemGit) {
    let dir = TempDir::new().unwrap();
    let git = SystemGit::init(dir.path()).unwrap();
    git.run(&["config", "user.email", "test@example.com"]).unwrap();
    git.run(&["config", "user.name", "Test"]).unwrap();
    (dir, git)
  }

  #[test]
  fn test_is_clean_tracks_untracked_files() {
    let (dir, git) = repo();
    assert!(git.is_clean().unwrap());

    fs::write(dir.path().join("file.txt"), "x").unwrap();
    assert!(!git.is_clean().unwrap());

    git.commit_all("add file").unwrap();
    assert!(git.is_clean().unwrap());
  }

  #[test]
  fn test_changed_files_and_commit_message() {
    let (dir, git) = repo();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    git.commit_all("first").unwrap();
    let first = git.head_commit().unwrap();

    fs::create_dir_all(dir.path().join("apps/web")).unwrap();
    fs::write(dir.path().join("apps/web/index.js"), "b").unwrap();
    git.commit_all("second\n\n[skip ci]").unwrap();

    let changed = git.changed_files_between(&first, "HEAD").unwrap();
    assert_eq!(changed, vec![PathBuf::from("apps/web/index.js")]);

    let info = git.head_commit_info().unwrap();
    assert_eq!(info.sha, git.head_commit().unwrap());
    assert!(info.message.starts_with("second"));
    assert!(info.message.contains("[skip ci]"));
  }

  #[test]
  fn test_missing_ref() {
    let (dir, git) = repo();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    git.commit_all("first").unwrap();

    let missing = "0123456789abcdef0123456789abcdef01234567";
    assert!(!git.ref_exists(missing).unwrap());
    assert!(matches!(
      git.changed_files_between(missing, "HEAD"),
      Err(ToolError::Git(GitError::RefNotFound { .. }))
    ));
  }
}
