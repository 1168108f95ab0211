//! Move `$VAR` entries out of `dependsOn` / `globalDependencies`
//!
//! turbo 1.5 introduced dedicated `env` and `globalEnv` keys. Environment
//! variables declared through the old `$` prefix move there, unprefixed.

use super::{
  TransformContext, TransformMeta, TransformOutcome, merge_unique, read_turbo_json, task_definitions_mut, write_json,
};
use crate::workspace::TURBO_JSON;
use semver::Version;
use serde_json::{Map, Value};

pub static META: TransformMeta = TransformMeta {
  name: "migrate-env-var-dependencies",
  description: "Migrate environment variable dependencies from \"dependsOn\" to \"env\" in turbo.json",
  introduced_in: Version::new(1, 5, 0),
};

pub fn apply(ctx: &mut TransformContext<'_>) -> TransformOutcome {
  let mut turbo = match read_turbo_json(ctx.stage) {
    Ok(value) => value,
    Err(outcome) => return outcome,
  };

  let mut changed = false;

  if let Some(obj) = turbo.as_object_mut() {
    changed |= move_env_entries(obj, "globalDependencies", "globalEnv");
  }

  if let Some(tasks) = task_definitions_mut(&mut turbo) {
    for (name, task) in tasks.iter_mut() {
      if let Some(task) = task.as_object_mut()
        && move_env_entries(task, "dependsOn", "env")
      {
        log::debug!("moved env dependencies of task '{}'", name);
        changed = true;
      }
    }
  }

  if !changed {
    return TransformOutcome::Unmodified;
  }
  write_json(ctx.stage, TURBO_JSON, &turbo)
}

/// Move `$`-prefixed strings from `from` into `to`; returns whether anything moved
fn move_env_entries(obj: &mut Map<String, Value>, from: &str, to: &str) -> bool {
  let Some(Value::Array(entries)) = obj.get_mut(from) else {
    return false;
  };

  let (vars, kept): (Vec<Value>, Vec<Value>) = std::mem::take(entries)
    .into_iter()
    .partition(|v| v.as_str().is_some_and(|s| s.starts_with('$')));
  *entries = kept;

  if vars.is_empty() {
    return false;
  }

  let vars = vars
    .into_iter()
    .filter_map(|v| v.as_str().map(|s| Value::String(s.trim_start_matches('$').to_string())));

  let env = obj.entry(to).or_insert_with(|| Value::Array(Vec::new()));
  match env {
    Value::Array(existing) => merge_unique(existing, vars),
    other => {
      let mut merged = Vec::new();
      merge_unique(&mut merged, vars);
      *other = Value::Array(merged);
    }
  }
  true
}
