//! Move the legacy `turbo` key from package.json into turbo.json

use super::{TransformContext, TransformMeta, TransformOutcome, write_json};
use crate::workspace::{PACKAGE_JSON, TURBO_JSON};
use semver::Version;
use serde_json::{Map, Value};

pub static META: TransformMeta = TransformMeta {
  name: "create-turbo-config",
  description: "Move the \"turbo\" key from package.json into turbo.json",
  introduced_in: Version::new(1, 1, 0),
};

const SCHEMA_URL: &str = "https://turbo.build/schema.json";

pub fn apply(ctx: &mut TransformContext<'_>) -> TransformOutcome {
  let mut package_json = match ctx.stage.read_json(PACKAGE_JSON) {
    Ok(Some(value)) => value,
    Ok(None) => return TransformOutcome::fatal("No package.json found"),
    Err(e) => return TransformOutcome::fatal(e.to_string()),
  };
  let Some(pkg) = package_json.as_object_mut() else {
    return TransformOutcome::fatal("package.json is not a JSON object");
  };

  let has_turbo_json = ctx.stage.exists(TURBO_JSON);

  if !pkg.contains_key("turbo") {
    return if has_turbo_json {
      TransformOutcome::Unmodified
    } else {
      TransformOutcome::not_applicable("no turbo configuration found in package.json")
    };
  }

  if has_turbo_json {
    return TransformOutcome::fatal(
      "Found turbo configuration in both package.json and turbo.json; merge them by hand",
    );
  }

  let Some(legacy) = pkg.shift_remove("turbo") else {
    return TransformOutcome::Unmodified;
  };
  let Value::Object(legacy) = legacy else {
    return TransformOutcome::fatal("The \"turbo\" key in package.json is not an object");
  };

  let mut turbo_json = Map::new();
  turbo_json.insert("$schema".to_string(), Value::String(SCHEMA_URL.to_string()));
  for (key, value) in legacy {
    if key != "$schema" {
      turbo_json.insert(key, value);
    }
  }

  let outcome = write_json(ctx.stage, TURBO_JSON, &Value::Object(turbo_json));
  if outcome != TransformOutcome::Success {
    return outcome;
  }
  write_json(ctx.stage, PACKAGE_JSON, &package_json)
}
