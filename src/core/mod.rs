//! Core building blocks shared by every subcommand
//!
//! - **config**: optional turbo-tools.toml (registry URL, timeouts)
//! - **error**: error types with contextual help messages
//! - **stage**: layered file edits with diff preview and atomic commit
//! - **vcs**: git operations via the system binary
//! - **version**: semantic version parsing and comparison

pub mod config;
pub mod error;
pub mod stage;
pub mod vcs;
pub mod version;
