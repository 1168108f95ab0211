//! Workspace dependency graph and affected analysis
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A depends on B"
//! - **Nodes**: workspace member packages only (external deps are not nodes)
//! - **Index**: name → node, plus member directories for file ownership

use super::{Workspace, WorkspacePackage};
use crate::core::error::{ToolError, ToolResult};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Workspace dependency graph built from member package.json files
pub struct WorkspaceGraph {
  graph: DiGraph<WorkspacePackage, ()>,

  /// Index: package name → node index
  name_to_node: HashMap<String, NodeIndex>,
}

impl WorkspaceGraph {
  /// Discover members and wire internal dependency edges
  pub fn load(workspace: &Workspace) -> ToolResult<Self> {
    Ok(Self::from_packages(workspace.packages()?))
  }

  pub fn from_packages(packages: Vec<WorkspacePackage>) -> Self {
    let mut graph = DiGraph::new();
    let mut name_to_node = HashMap::new();

    for package in packages {
      let name = package.name.clone();
      let idx = graph.add_node(package);
      if name_to_node.insert(name.clone(), idx).is_some() {
        log::warn!("duplicate workspace package name '{}'", name);
      }
    }

    let edges: Vec<(NodeIndex, NodeIndex)> = graph
      .node_indices()
      .flat_map(|from| {
        graph[from]
          .dependencies
          .iter()
          .filter_map(|dep| name_to_node.get(dep).copied())
          .map(move |to| (from, to))
          .collect::<Vec<_>>()
      })
      .collect();

    for (from, to) in edges {
      graph.add_edge(from, to, ());
    }

    log::debug!(
      "workspace graph: {} packages, {} internal edges",
      graph.node_count(),
      graph.edge_count()
    );

    Self { graph, name_to_node }
  }

  /// All member package names, sorted
  pub fn members(&self) -> Vec<String> {
    let mut members: Vec<_> = self.name_to_node.keys().cloned().collect();
    members.sort();
    members
  }

  pub fn contains(&self, name: &str) -> bool {
    self.name_to_node.contains_key(name)
  }

  /// `name` plus every workspace package it depends on, directly or not
  pub fn with_transitive_dependencies(&self, name: &str) -> ToolResult<BTreeSet<String>> {
    let start = self.find_node(name)?;
    let mut dfs = Dfs::new(&self.graph, start);
    let mut result = BTreeSet::new();
    while let Some(idx) = dfs.next(&self.graph) {
      result.insert(self.graph[idx].name.clone());
    }
    Ok(result)
  }

  /// Directory of a member package, relative to the workspace root
  pub fn package_dir(&self, name: &str) -> Option<&Path> {
    let idx = self.name_to_node.get(name)?;
    Some(self.graph[*idx].path.as_path())
  }

  /// Package owning a repo-relative file (deepest containing member)
  pub fn package_for_file(&self, file: &Path) -> Option<&str> {
    self
      .graph
      .node_weights()
      .filter(|pkg| file.starts_with(&pkg.path) && !pkg.path.as_os_str().is_empty())
      .max_by_key(|pkg| pkg.path.components().count())
      .map(|pkg| pkg.name.as_str())
  }

  fn find_node(&self, name: &str) -> ToolResult<NodeIndex> {
    self.name_to_node.get(name).copied().ok_or_else(|| {
      ToolError::message(format!(
        "Workspace '{}' not found. Available workspaces: {}",
        name,
        self.members().join(", ")
      ))
    })
  }
}

/// Why a workspace is considered changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffectedReason {
  /// A file inside the workspace or one of its dependencies changed
  Package { package: String, file: PathBuf },
  /// A file every task depends on changed
  Global { file: PathBuf },
}

/// First reason `target` is affected by `changed_files`, `None` if it is not
///
/// `is_global` flags files that invalidate every workspace (root manifest,
/// lockfiles, turbo.json, globalDependencies).
pub fn analyze(
  graph: &WorkspaceGraph,
  target: &str,
  changed_files: &[PathBuf],
  is_global: impl Fn(&Path) -> bool,
) -> ToolResult<Option<AffectedReason>> {
  let scope = graph.with_transitive_dependencies(target)?;

  for file in changed_files {
    if is_global(file) {
      return Ok(Some(AffectedReason::Global { file: file.clone() }));
    }
    if let Some(owner) = graph.package_for_file(file)
      && scope.contains(owner)
    {
      return Ok(Some(AffectedReason::Package {
        package: owner.to_string(),
        file: file.clone(),
      }));
    }
  }

  Ok(None)
}
