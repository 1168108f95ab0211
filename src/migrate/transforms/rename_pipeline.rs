//! Rename the top-level `pipeline` key to `tasks` (turbo 2.0)

use super::{TransformContext, TransformMeta, TransformOutcome, read_turbo_json, rename_key, write_json};
use crate::workspace::TURBO_JSON;
use semver::Version;

pub static META: TransformMeta = TransformMeta {
  name: "rename-pipeline",
  description: "Rename the \"pipeline\" key to \"tasks\" in turbo.json",
  introduced_in: Version::new(2, 0, 0),
};

pub fn apply(ctx: &mut TransformContext<'_>) -> TransformOutcome {
  let mut turbo = match read_turbo_json(ctx.stage) {
    Ok(value) => value,
    Err(outcome) => return outcome,
  };
  let Some(obj) = turbo.as_object_mut() else {
    return TransformOutcome::fatal("turbo.json is not a JSON object");
  };

  match (obj.contains_key("pipeline"), obj.contains_key("tasks")) {
    (false, _) => TransformOutcome::Unmodified,
    (true, true) => TransformOutcome::fatal("turbo.json defines both \"pipeline\" and \"tasks\""),
    (true, false) => {
      rename_key(obj, "pipeline", "tasks");
      write_json(ctx.stage, TURBO_JSON, &turbo)
    }
  }
}
