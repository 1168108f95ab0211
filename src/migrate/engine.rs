//! Migration engine
//!
//! ```text
//! Init → GitCheck → VersionResolution → PlanComputation → Execution → Install → Done
//!   └──────────────────────── any failure: Aborted (ToolError) ──────────────────┘
//! ```
//!
//! The engine is not transactional across transforms. A real run commits
//! each transform's files as soon as it succeeds, so a fatal error leaves
//! earlier transforms applied; the error lists them and re-running is the
//! recovery path.

use super::MigrateOptions;
use super::host::{GitStatus, MigrationHost};
use super::plan::MigrationPlan;
use super::transforms::{BuiltinTransform, Transform, TransformContext, TransformOutcome};
use crate::core::error::{ToolError, ToolResult, VersionRole};
use crate::core::stage::{FileChange, FileStage};
use crate::core::version;
use crate::ui;
use crate::workspace::{PACKAGE_JSON, Workspace};
use semver::Version;
use std::path::Path;

/// What happened to one transform
#[derive(Debug, Clone)]
pub struct TransformRecord {
  pub transform: BuiltinTransform,
  pub outcome: TransformOutcome,
  /// Files changed (or that would change, in a dry run)
  pub changes: Vec<FileChange>,
}

/// What the install step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStep {
  Skipped,
  /// Dry run: the command was resolved and shown only
  Previewed { command: String },
  Ran { command: String },
}

#[derive(Debug, Clone)]
pub struct MigrationReport {
  pub plan: MigrationPlan,
  pub dry: bool,
  pub records: Vec<TransformRecord>,
  pub install: InstallStep,
}

impl MigrationReport {
  /// Names of transforms that changed the repository
  pub fn applied(&self) -> Vec<&'static str> {
    applied_names(&self.records)
  }

  /// Non-fatal errors, as `(transform, message)`
  pub fn errors(&self) -> Vec<(&'static str, &str)> {
    self
      .records
      .iter()
      .filter_map(|r| match &r.outcome {
        TransformOutcome::Error { fatal: false, message } => Some((r.transform.name(), message.as_str())),
        _ => None,
      })
      .collect()
  }
}

#[derive(Debug, Clone)]
pub enum MigrationOutcome {
  /// Current and target versions are equal; nothing ran
  UpToDate { version: Version },
  Completed(MigrationReport),
}

pub struct MigrationEngine<'h> {
  host: &'h dyn MigrationHost,
}

impl<'h> MigrationEngine<'h> {
  pub fn new(host: &'h dyn MigrationHost) -> Self {
    Self { host }
  }

  /// Run a full migration
  pub fn run(&self, root: &Path, options: &MigrateOptions) -> ToolResult<MigrationOutcome> {
    let workspace = self.init(root)?;
    self.check_git(root, options)?;

    let (current, target) = self.resolve_versions(&workspace, options)?;
    println!("🔍 turbo {} → {}", current, target);

    if current == target {
      println!("✅ Already up to date (turbo {})", current);
      return Ok(MigrationOutcome::UpToDate { version: current });
    }
    if current > target {
      log::warn!("target version {} is older than current version {}", target, current);
      ui::warn(&format!(
        "Target version {} is older than the current version {}; no transforms will run",
        target, current
      ));
    }

    let plan = MigrationPlan::for_range(&current, &target);
    println!("\n{}", plan.to_human_readable());

    let records = self.execute(&workspace, &plan, options)?;
    let install = self.install(&workspace, &target, options)?;

    Ok(MigrationOutcome::Completed(MigrationReport {
      plan,
      dry: options.dry,
      records,
      install,
    }))
  }

  /// Run a single transform by hand: no version resolution, no install
  pub fn run_single(
    &self,
    root: &Path,
    transform: BuiltinTransform,
    options: &MigrateOptions,
  ) -> ToolResult<MigrationReport> {
    let workspace = self.init(root)?;
    self.check_git(root, options)?;

    let plan = MigrationPlan::single(transform);
    let records = self.execute(&workspace, &plan, options)?;

    Ok(MigrationReport {
      plan,
      dry: options.dry,
      records,
      install: InstallStep::Skipped,
    })
  }

  fn init(&self, root: &Path) -> ToolResult<Workspace> {
    if !root.is_dir() {
      return Err(ToolError::InvalidDirectory {
        path: root.to_path_buf(),
        reason: "not a directory".to_string(),
      });
    }
    if !root.join(PACKAGE_JSON).is_file() {
      return Err(ToolError::InvalidDirectory {
        path: root.to_path_buf(),
        reason: "no package.json found".to_string(),
      });
    }

    self.host.workspace_details(root)
  }

  fn check_git(&self, root: &Path, options: &MigrateOptions) -> ToolResult<()> {
    if options.dry {
      log::debug!("dry run: skipping git status check");
      return Ok(());
    }

    match self.host.git_status(root) {
      Ok(GitStatus::Clean) => Ok(()),
      Ok(GitStatus::Dirty) if options.force => {
        ui::warn("Working tree has uncommitted changes; continuing because of --force");
        Ok(())
      }
      Ok(GitStatus::Dirty) => Err(ToolError::DirtyWorkingTree {
        path: root.to_path_buf(),
      }),
      Err(e) if options.force => {
        ui::warn(&format!("{}; continuing because of --force", e));
        Ok(())
      }
      Err(e) => Err(e),
    }
  }

  fn resolve_versions(&self, workspace: &Workspace, options: &MigrateOptions) -> ToolResult<(Version, Version)> {
    let current = match &options.from {
      Some(from) => version::parse(from)?,
      None => resolved(VersionRole::Current, self.host.current_version(workspace))?,
    };

    let target = match &options.to {
      Some(to) => version::parse(to)?,
      None => resolved(VersionRole::Target, self.host.latest_version())?,
    };

    Ok((current, target))
  }

  /// Run the plan against a stage, committing (real) or simulating (dry)
  fn execute(
    &self,
    workspace: &Workspace,
    plan: &MigrationPlan,
    options: &MigrateOptions,
  ) -> ToolResult<Vec<TransformRecord>> {
    let mut stage = FileStage::new(&workspace.root);
    let mut records: Vec<TransformRecord> = Vec::with_capacity(plan.len());
    let mut first_fatal: Option<(BuiltinTransform, String)> = None;

    if options.dry && !plan.is_empty() {
      println!("🧪 Dry run: no files will be written\n");
    }

    for &transform in &plan.transforms {
      let outcome = {
        let mut ctx = TransformContext {
          root: &workspace.root,
          workspace,
          options,
          stage: &mut stage,
        };
        transform.apply(&mut ctx)
      };

      let (outcome, changes) = settle(&mut stage, outcome, options.dry);
      report_transform(transform, &outcome, &changes, options.print);

      let fatal_message = match &outcome {
        TransformOutcome::Error { fatal: true, message } => Some(message.clone()),
        _ => None,
      };
      records.push(TransformRecord {
        transform,
        outcome,
        changes,
      });

      if let Some(message) = fatal_message {
        if !options.dry {
          return Err(ToolError::TransformFatal {
            transform: transform.name().to_string(),
            message,
            applied: owned(applied_names(&records)),
          });
        }
        if first_fatal.is_none() {
          first_fatal = Some((transform, message));
        }
      }
    }

    if let Some((transform, message)) = first_fatal {
      return Err(ToolError::TransformFatal {
        transform: transform.name().to_string(),
        message,
        applied: owned(applied_names(&records)),
      });
    }

    Ok(records)
  }

  fn install(&self, workspace: &Workspace, target: &Version, options: &MigrateOptions) -> ToolResult<InstallStep> {
    if !options.install {
      return Ok(InstallStep::Skipped);
    }

    let command = self.host.upgrade_command(workspace, target);

    if options.dry {
      return Ok(match command {
        Some(command) => {
          println!("📦 Would upgrade turbo with: {}", command);
          InstallStep::Previewed { command }
        }
        None => {
          ui::warn("Unable to determine the upgrade command for this repository");
          InstallStep::Skipped
        }
      });
    }

    let Some(command) = command else {
      return Err(ToolError::UnresolvableUpgradeCommand {
        package_manager: workspace.package_manager.as_ref().map(|pm| pm.to_string()),
      });
    };

    println!("📦 Upgrading turbo: {}", command);
    self.host.stop_daemon(&workspace.root);
    self.host.run_install(&workspace.root, &command)?;
    println!("   ✅ Upgraded turbo to {}", target);

    Ok(InstallStep::Ran { command })
  }
}

/// Map a host version lookup onto `UnresolvableVersion`
fn resolved(which: VersionRole, lookup: ToolResult<Option<String>>) -> ToolResult<Version> {
  match lookup {
    Ok(Some(v)) => version::parse(&v),
    Ok(None) => Err(ToolError::UnresolvableVersion { which, reason: None }),
    Err(e) => Err(ToolError::UnresolvableVersion {
      which,
      reason: Some(e.to_string()),
    }),
  }
}

/// Turn a transform's raw outcome plus staged files into the final outcome
///
/// A `Success` that changed no bytes becomes `Unmodified`. Anything other
/// than `Success` has its staged writes dropped.
fn settle(stage: &mut FileStage, outcome: TransformOutcome, dry: bool) -> (TransformOutcome, Vec<FileChange>) {
  if outcome != TransformOutcome::Success {
    stage.discard();
    return (outcome, Vec::new());
  }

  let changes = match stage.pending_changes() {
    Ok(changes) => changes,
    Err(e) => {
      stage.discard();
      return (TransformOutcome::non_fatal(e.to_string()), Vec::new());
    }
  };

  if changes.is_empty() {
    stage.discard();
    return (TransformOutcome::Unmodified, changes);
  }

  if dry {
    stage.absorb();
    return (TransformOutcome::Success, changes);
  }

  match stage.commit() {
    Ok(_) => (TransformOutcome::Success, changes),
    Err(e) => (TransformOutcome::non_fatal(e.to_string()), changes),
  }
}

fn report_transform(transform: BuiltinTransform, outcome: &TransformOutcome, changes: &[FileChange], print: bool) {
  let marker = match outcome {
    TransformOutcome::Success => "✅",
    TransformOutcome::NotApplicable { .. } | TransformOutcome::Unmodified => "⏭️ ",
    TransformOutcome::Error { fatal: false, .. } => "⚠️ ",
    TransformOutcome::Error { fatal: true, .. } => "❌",
  };
  println!("   {} {}: {}", marker, transform.name(), outcome);

  for change in changes {
    println!("      {:?} {}", change.kind(), change.path.display());
    if print {
      println!("{}", ui::indent(&change.unified_diff(), 6));
    }
  }
}

fn applied_names(records: &[TransformRecord]) -> Vec<&'static str> {
  records
    .iter()
    .filter(|r| r.outcome == TransformOutcome::Success)
    .map(|r| r.transform.name())
    .collect()
}

fn owned(names: Vec<&'static str>) -> Vec<String> {
  names.into_iter().map(str::to_string).collect()
}
