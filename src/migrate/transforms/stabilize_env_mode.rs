//! Drop the `experimental` prefix from pass-through env keys (turbo 1.10)

use super::{
  TransformContext, TransformMeta, TransformOutcome, merge_unique, read_turbo_json, rename_key, task_definitions_mut,
  write_json,
};
use crate::workspace::TURBO_JSON;
use semver::Version;
use serde_json::{Map, Value};

pub static META: TransformMeta = TransformMeta {
  name: "stabilize-env-mode",
  description: "Rename experimental pass-through env keys to their stable names in turbo.json",
  introduced_in: Version::new(1, 10, 0),
};

pub fn apply(ctx: &mut TransformContext<'_>) -> TransformOutcome {
  let mut turbo = match read_turbo_json(ctx.stage) {
    Ok(value) => value,
    Err(outcome) => return outcome,
  };

  let mut changed = false;

  if let Some(obj) = turbo.as_object_mut() {
    changed |= stabilize(obj, "experimentalGlobalPassThroughEnv", "globalPassThroughEnv");
  }

  if let Some(tasks) = task_definitions_mut(&mut turbo) {
    for task in tasks.values_mut().filter_map(Value::as_object_mut) {
      changed |= stabilize(task, "experimentalPassThroughEnv", "passThroughEnv");
    }
  }

  if !changed {
    return TransformOutcome::Unmodified;
  }
  write_json(ctx.stage, TURBO_JSON, &turbo)
}

/// Rename `experimental` to `stable`, merging into an existing stable list
fn stabilize(obj: &mut Map<String, Value>, experimental: &str, stable: &str) -> bool {
  if !obj.contains_key(experimental) {
    return false;
  }

  if !obj.contains_key(stable) {
    return rename_key(obj, experimental, stable);
  }

  let Some(old) = obj.shift_remove(experimental) else {
    return false;
  };
  // Non-list values: the stable key wins
  if let (Some(Value::Array(existing)), Value::Array(additions)) = (obj.get_mut(stable), old) {
    merge_unique(existing, additions);
  }
  true
}
