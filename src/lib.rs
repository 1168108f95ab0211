//! turbo-tools: scaffold, migrate, and gate CI builds for turbo monorepos
//!
//! - **create**: new monorepo from a starter template
//! - **migrate**: ordered, version-gated codemods plus the turbo upgrade
//! - **ignore**: whether a workspace changed since its last deployment
//!
//! Shared plumbing lives in `core` (errors, config, staging, git) and
//! `workspace` (package.json model, package managers, dependency graph).

pub mod commands;
pub mod core;
pub mod create;
pub mod ignore;
pub mod migrate;
pub mod ui;
pub mod workspace;
