//! Built-in codemods
//!
//! Each transform lives in its own module exposing a `META` descriptor and
//! an `apply` function. `BuiltinTransform` is the closed set the registry
//! orders; everything else talks to transforms through the `Transform`
//! trait.
//!
//! Transforms read whole JSON documents through the `FileStage`, mutate them
//! in memory, and stage the result. They never write to disk themselves.

pub mod add_package_manager;
pub mod create_turbo_config;
pub mod migrate_env_var_dependencies;
pub mod rename_pipeline;
pub mod set_default_outputs;
pub mod stabilize_env_mode;

use crate::core::stage::FileStage;
use crate::migrate::MigrateOptions;
use crate::workspace::{TURBO_JSON, Workspace};
use semver::Version;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Static description of a transform
#[derive(Debug)]
pub struct TransformMeta {
  pub name: &'static str,
  pub description: &'static str,
  pub introduced_in: Version,
}

/// Result of applying one transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum TransformOutcome {
  /// Changes staged
  Success,
  /// Precondition does not hold for this repository; nothing staged
  NotApplicable { reason: String },
  /// Ran and found nothing to change
  Unmodified,
  /// Failed; fatal errors halt the plan
  Error { fatal: bool, message: String },
}

impl TransformOutcome {
  pub fn not_applicable(reason: impl Into<String>) -> Self {
    TransformOutcome::NotApplicable { reason: reason.into() }
  }

  pub fn fatal(message: impl Into<String>) -> Self {
    TransformOutcome::Error {
      fatal: true,
      message: message.into(),
    }
  }

  pub fn non_fatal(message: impl Into<String>) -> Self {
    TransformOutcome::Error {
      fatal: false,
      message: message.into(),
    }
  }

  pub fn is_fatal(&self) -> bool {
    matches!(self, TransformOutcome::Error { fatal: true, .. })
  }
}

impl fmt::Display for TransformOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TransformOutcome::Success => write!(f, "success"),
      TransformOutcome::NotApplicable { reason } => write!(f, "not applicable ({})", reason),
      TransformOutcome::Unmodified => write!(f, "unmodified"),
      TransformOutcome::Error { fatal: true, message } => write!(f, "fatal error: {}", message),
      TransformOutcome::Error { fatal: false, message } => write!(f, "error: {}", message),
    }
  }
}

/// Everything a transform may look at or write to
pub struct TransformContext<'a> {
  pub root: &'a Path,
  pub workspace: &'a Workspace,
  pub options: &'a MigrateOptions,
  pub stage: &'a mut FileStage,
}

/// A named, versioned, idempotent repository mutation
pub trait Transform {
  fn meta(&self) -> &'static TransformMeta;

  fn name(&self) -> &'static str {
    self.meta().name
  }

  fn description(&self) -> &'static str {
    self.meta().description
  }

  fn introduced_in(&self) -> &'static Version {
    &self.meta().introduced_in
  }

  /// True iff `current < introduced_in <= target`
  fn applies(&self, current: &Version, target: &Version) -> bool {
    let introduced = self.introduced_in();
    introduced > current && introduced <= target
  }

  fn apply(&self, ctx: &mut TransformContext<'_>) -> TransformOutcome;
}

/// The closed set of built-in transforms, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTransform {
  AddPackageManager,
  CreateTurboConfig,
  MigrateEnvVarDependencies,
  SetDefaultOutputs,
  StabilizeEnvMode,
  RenamePipeline,
}

impl BuiltinTransform {
  pub const ALL: [BuiltinTransform; 6] = [
    BuiltinTransform::AddPackageManager,
    BuiltinTransform::CreateTurboConfig,
    BuiltinTransform::MigrateEnvVarDependencies,
    BuiltinTransform::SetDefaultOutputs,
    BuiltinTransform::StabilizeEnvMode,
    BuiltinTransform::RenamePipeline,
  ];
}

impl Transform for BuiltinTransform {
  fn meta(&self) -> &'static TransformMeta {
    match self {
      BuiltinTransform::AddPackageManager => &add_package_manager::META,
      BuiltinTransform::CreateTurboConfig => &create_turbo_config::META,
      BuiltinTransform::MigrateEnvVarDependencies => &migrate_env_var_dependencies::META,
      BuiltinTransform::SetDefaultOutputs => &set_default_outputs::META,
      BuiltinTransform::StabilizeEnvMode => &stabilize_env_mode::META,
      BuiltinTransform::RenamePipeline => &rename_pipeline::META,
    }
  }

  fn apply(&self, ctx: &mut TransformContext<'_>) -> TransformOutcome {
    match self {
      BuiltinTransform::AddPackageManager => add_package_manager::apply(ctx),
      BuiltinTransform::CreateTurboConfig => create_turbo_config::apply(ctx),
      BuiltinTransform::MigrateEnvVarDependencies => migrate_env_var_dependencies::apply(ctx),
      BuiltinTransform::SetDefaultOutputs => set_default_outputs::apply(ctx),
      BuiltinTransform::StabilizeEnvMode => stabilize_env_mode::apply(ctx),
      BuiltinTransform::RenamePipeline => rename_pipeline::apply(ctx),
    }
  }
}

impl fmt::Display for BuiltinTransform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// Read turbo.json through the stage
///
/// A missing or unparseable file is fatal: the repository is not in a
/// layout these transforms can migrate.
pub(crate) fn read_turbo_json(stage: &FileStage) -> Result<Value, TransformOutcome> {
  match stage.read_json(TURBO_JSON) {
    Ok(Some(value)) if value.is_object() => Ok(value),
    Ok(Some(_)) => Err(TransformOutcome::fatal("turbo.json is not a JSON object")),
    Ok(None) => Err(TransformOutcome::fatal("No turbo.json found")),
    Err(e) => Err(TransformOutcome::fatal(e.to_string())),
  }
}

/// Stage turbo.json, mapping a serialization failure to a non-fatal error
pub(crate) fn write_json(stage: &mut FileStage, rel: &str, value: &Value) -> TransformOutcome {
  match stage.write_json(rel, value) {
    Ok(()) => TransformOutcome::Success,
    Err(e) => TransformOutcome::non_fatal(format!("Unable to write {}: {}", rel, e)),
  }
}

/// Task definitions of a turbo.json (`pipeline` before 2.0, `tasks` after)
pub(crate) fn task_definitions_mut(turbo: &mut Value) -> Option<&mut Map<String, Value>> {
  let obj = turbo.as_object_mut()?;
  let key = if obj.contains_key("pipeline") { "pipeline" } else { "tasks" };
  obj.get_mut(key)?.as_object_mut()
}

/// Rename a key in place, keeping its position; no-op if `from` is absent
pub(crate) fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) -> bool {
  if !map.contains_key(from) {
    return false;
  }

  let entries = std::mem::take(map);
  for (key, value) in entries {
    if key == from {
      map.insert(to.to_string(), value);
    } else {
      map.insert(key, value);
    }
  }
  true
}

/// Append values not already present, keeping first-seen order
pub(crate) fn merge_unique(target: &mut Vec<Value>, additions: impl IntoIterator<Item = Value>) {
  for value in additions {
    if !target.contains(&value) {
      target.push(value);
    }
  }
}
