//! Git access via the system `git` binary

pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

/// Subset of the most recent commit used by `ignore`
#[derive(Debug, Clone)]
pub struct CommitInfo {
  pub sha: String,
  pub message: String,
}
