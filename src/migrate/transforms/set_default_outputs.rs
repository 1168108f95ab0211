//! Make pre-1.7 default outputs explicit
//!
//! Before 1.7 a task without `outputs` cached `dist/**` and `build/**`, and
//! `outputs: []` meant "cache nothing". From 1.7 on, a missing key means
//! nothing is cached. Cacheable tasks are rewritten so they keep caching
//! what they cached before.

use super::{TransformContext, TransformMeta, TransformOutcome, read_turbo_json, task_definitions_mut, write_json};
use crate::workspace::TURBO_JSON;
use semver::Version;
use serde_json::Value;

pub static META: TransformMeta = TransformMeta {
  name: "set-default-outputs",
  description: "Add the \"outputs\" key with defaults where it is missing in turbo.json",
  introduced_in: Version::new(1, 7, 0),
};

pub const DEFAULT_OUTPUTS: [&str; 2] = ["dist/**", "build/**"];

pub fn apply(ctx: &mut TransformContext<'_>) -> TransformOutcome {
  let mut turbo = match read_turbo_json(ctx.stage) {
    Ok(value) => value,
    Err(outcome) => return outcome,
  };

  let Some(tasks) = task_definitions_mut(&mut turbo) else {
    return TransformOutcome::Unmodified;
  };

  let mut changed = false;
  for task in tasks.values_mut() {
    let Some(task) = task.as_object_mut() else { continue };
    if task.get("cache") == Some(&Value::Bool(false)) {
      continue;
    }

    match task.get("outputs") {
      None => {
        let defaults = DEFAULT_OUTPUTS.iter().map(|s| Value::String(s.to_string())).collect();
        task.insert("outputs".to_string(), Value::Array(defaults));
        changed = true;
      }
      // Not idempotent on its own: a second pass re-adds the defaults.
      // Version gating keeps it from running twice on one repository.
      Some(Value::Array(outputs)) if outputs.is_empty() => {
        task.shift_remove("outputs");
        changed = true;
      }
      Some(_) => {}
    }
  }

  if !changed {
    return TransformOutcome::Unmodified;
  }
  write_json(ctx.stage, TURBO_JSON, &turbo)
}
