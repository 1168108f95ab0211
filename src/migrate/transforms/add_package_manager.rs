//! Set `packageManager` in the root package.json

use super::{TransformContext, TransformMeta, TransformOutcome, write_json};
use crate::workspace::PACKAGE_JSON;
use semver::Version;
use serde_json::Value;

pub static META: TransformMeta = TransformMeta {
  name: "add-package-manager",
  description: "Set the \"packageManager\" key in root package.json",
  introduced_in: Version::new(1, 1, 0),
};

pub fn apply(ctx: &mut TransformContext<'_>) -> TransformOutcome {
  let mut package_json = match ctx.stage.read_json(PACKAGE_JSON) {
    Ok(Some(value)) => value,
    Ok(None) => return TransformOutcome::fatal("No package.json found"),
    Err(e) => return TransformOutcome::fatal(e.to_string()),
  };

  let Some(manager) = &ctx.workspace.package_manager else {
    return TransformOutcome::fatal("Unable to determine package manager");
  };
  let Some(version) = &manager.version else {
    return TransformOutcome::fatal(format!("Unable to determine {} version", manager.name));
  };

  let expected = format!("{}@{}", manager.name, version);
  let Some(obj) = package_json.as_object_mut() else {
    return TransformOutcome::fatal("package.json is not a JSON object");
  };

  if obj.get("packageManager").and_then(Value::as_str) == Some(expected.as_str()) {
    return TransformOutcome::Unmodified;
  }

  log::debug!("setting packageManager to {}", expected);
  obj.insert("packageManager".to_string(), Value::String(expected));
  write_json(ctx.stage, PACKAGE_JSON, &package_json)
}
