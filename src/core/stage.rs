//! Staged file edits for transforms
//!
//! Transforms never touch the disk directly. They read and write through a
//! `FileStage`, which layers three views of a file (newest first):
//!
//! ```text
//! pending   writes made by the transform that is currently running
//! overlay   writes absorbed from earlier transforms (dry runs only)
//! disk      the repository as it is
//! ```
//!
//! After a transform returns, the engine either commits the pending writes
//! (atomic replace, one file at a time) or absorbs them into the overlay so
//! later transforms in a dry run see the simulated state.

use crate::core::error::{ResultExt, ToolResult};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::Serialize;
use serde_json::Value;
use similar::TextDiff;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Contents of a file at some layer; `None` means the file does not exist
type Contents = Option<String>;

/// A single file-level change produced by a transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
  /// Path relative to the stage root
  pub path: PathBuf,
  pub before: Contents,
  pub after: Contents,
}

impl FileChange {
  pub fn kind(&self) -> ChangeKind {
    match (&self.before, &self.after) {
      (None, Some(_)) => ChangeKind::Created,
      (Some(_), None) => ChangeKind::Deleted,
      _ => ChangeKind::Modified,
    }
  }

  /// Unified diff of the change, `a/` and `b/` prefixed like git
  pub fn unified_diff(&self) -> String {
    let before = self.before.as_deref().unwrap_or("");
    let after = self.after.as_deref().unwrap_or("");
    let diff = TextDiff::from_lines(before, after);
    format!(
      "{}",
      diff.unified_diff().context_radius(3).header(
        &format!("a/{}", self.path.display()),
        &format!("b/{}", self.path.display())
      )
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
  Created,
  Modified,
  Deleted,
}

/// Layered view of a repository's files
#[derive(Debug)]
pub struct FileStage {
  root: PathBuf,
  overlay: BTreeMap<PathBuf, Contents>,
  pending: BTreeMap<PathBuf, Contents>,
}

impl FileStage {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      overlay: BTreeMap::new(),
      pending: BTreeMap::new(),
    }
  }

  /// Whether the file exists in the staged view
  pub fn exists(&self, rel: impl AsRef<Path>) -> bool {
    let rel = rel.as_ref();
    if let Some(contents) = self.pending.get(rel).or_else(|| self.overlay.get(rel)) {
      return contents.is_some();
    }
    self.root.join(rel).is_file()
  }

  /// Read a file through the staged view
  pub fn read(&self, rel: impl AsRef<Path>) -> ToolResult<Contents> {
    let rel = rel.as_ref();
    if let Some(contents) = self.pending.get(rel) {
      return Ok(contents.clone());
    }
    self.read_committed(rel)
  }

  /// Read and parse a JSON file through the staged view
  pub fn read_json(&self, rel: impl AsRef<Path>) -> ToolResult<Option<Value>> {
    let rel = rel.as_ref();
    match self.read(rel)? {
      Some(text) => {
        let value =
          serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", rel.display()))?;
        Ok(Some(value))
      }
      None => Ok(None),
    }
  }

  /// Stage new contents for a file
  pub fn write(&mut self, rel: impl Into<PathBuf>, contents: impl Into<String>) {
    self.pending.insert(rel.into(), Some(contents.into()));
  }

  /// Stage a JSON document: two-space indentation and a trailing newline
  pub fn write_json(&mut self, rel: impl Into<PathBuf>, value: &Value) -> ToolResult<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    self.write(rel, text);
    Ok(())
  }

  /// Stage removal of a file
  pub fn remove(&mut self, rel: impl Into<PathBuf>) {
    self.pending.insert(rel.into(), None);
  }

  /// Effective changes staged by the running transform (no-op writes excluded)
  pub fn pending_changes(&self) -> ToolResult<Vec<FileChange>> {
    let mut changes = Vec::new();
    for (path, after) in &self.pending {
      let before = self.read_committed(path)?;
      if &before != after {
        changes.push(FileChange {
          path: path.clone(),
          before,
          after: after.clone(),
        });
      }
    }
    Ok(changes)
  }

  /// Keep pending writes in memory so later reads observe them (dry runs)
  pub fn absorb(&mut self) {
    let pending = std::mem::take(&mut self.pending);
    self.overlay.extend(pending);
  }

  /// Drop pending writes
  pub fn discard(&mut self) {
    self.pending.clear();
  }

  /// Write pending changes to disk
  ///
  /// Order: new files, modified files, removals. Each file is replaced
  /// atomically; if any write fails, files already written are restored and
  /// the error is returned. Pending writes are cleared either way.
  pub fn commit(&mut self) -> ToolResult<Vec<PathBuf>> {
    let mut changes = self.pending_changes()?;
    self.pending.clear();
    changes.sort_by_key(|change| match change.kind() {
      ChangeKind::Created => 0,
      ChangeKind::Modified => 1,
      ChangeKind::Deleted => 2,
    });

    let mut written: Vec<FileChange> = Vec::with_capacity(changes.len());
    for change in changes {
      if let Err(e) = self.apply_contents(&change.path, change.after.as_deref()) {
        self.rollback(&written);
        return Err(e);
      }
      log::debug!("committed {}", change.path.display());
      written.push(change);
    }

    Ok(written.into_iter().map(|change| change.path).collect())
  }

  fn apply_contents(&self, rel: &Path, contents: Option<&str>) -> ToolResult<()> {
    let full_path = self.root.join(rel);
    match contents {
      Some(contents) => write_atomic(&full_path, contents).with_context(|| format!("Failed to write {}", rel.display())),
      None if full_path.exists() => {
        fs::remove_file(&full_path).with_context(|| format!("Failed to remove {}", rel.display()))
      }
      None => Ok(()),
    }
  }

  /// Put already-committed files back to their previous contents
  fn rollback(&self, written: &[FileChange]) {
    for change in written.iter().rev() {
      match self.apply_contents(&change.path, change.before.as_deref()) {
        Ok(()) => log::debug!("rolled back {}", change.path.display()),
        Err(e) => log::warn!("failed to roll back {}: {}", change.path.display(), e),
      }
    }
  }

  /// Contents as of the last commit/absorb (overlay, then disk)
  fn read_committed(&self, rel: &Path) -> ToolResult<Contents> {
    if let Some(contents) = self.overlay.get(rel) {
      return Ok(contents.clone());
    }

    let full_path = self.root.join(rel);
    if !full_path.is_file() {
      return Ok(None);
    }
    let text = fs::read_to_string(&full_path).with_context(|| format!("Failed to read {}", rel.display()))?;
    Ok(Some(text))
  }
}

/// Replace a file's contents atomically, creating parent directories
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }

  AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
    .write(|f| {
      f.write_all(contents.as_bytes())?;
      f.flush()
    })
    .map_err(std::io::Error::other)
}
