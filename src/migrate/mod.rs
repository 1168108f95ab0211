//! Versioned codemod pipeline
//!
//! - **registry**: ordered catalog of built-in transforms
//! - **plan**: the transforms selected for one version range
//! - **engine**: state machine that validates, plans, executes, and installs
//! - **host**: git, version lookups, and install commands behind one trait
//! - **transforms**: the codemods themselves

pub mod engine;
pub mod host;
pub mod plan;
pub mod registry;
pub mod transforms;

pub use engine::{InstallStep, MigrationEngine, MigrationOutcome, MigrationReport, TransformRecord};
pub use host::{GitStatus, MigrationHost, SystemHost};
pub use plan::MigrationPlan;
pub use transforms::{BuiltinTransform, Transform, TransformOutcome};

/// Options for one migration run
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
  /// Skip the clean-working-tree requirement
  pub force: bool,
  /// Simulate without writing files or installing
  pub dry: bool,
  /// Print a diff for every changed file
  pub print: bool,
  /// Upgrade turbo after the transforms succeed
  pub install: bool,
  /// Current version override
  pub from: Option<String>,
  /// Target version override
  pub to: Option<String>,
}
