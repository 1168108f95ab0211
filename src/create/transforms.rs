//! Post-copy fixups applied to a freshly scaffolded project
//!
//! Same contract as the migration transforms: read through a `FileStage`,
//! stage changes, report a `TransformOutcome`. The scaffolder commits after
//! each one.

use super::Template;
use crate::core::stage::FileStage;
use crate::core::version;
use crate::migrate::transforms::TransformOutcome;
use crate::workspace::package_manager::PackageManager;
use crate::workspace::{PACKAGE_JSON, PNPM_WORKSPACE, PackageManagerInfo};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;

const META_JSON: &str = "meta.json";
const GITIGNORE: &str = ".gitignore";

const DEFAULT_GITIGNORE: &str = "\
# dependencies
node_modules
.pnp
.pnp.js

# build output
dist
build
.next
out

# turbo
.turbo

# misc
.DS_Store
*.pem
.env*.local
npm-debug.log*
yarn-debug.log*
yarn-error.log*
";

/// Inputs shared by every create transform
pub struct CreateContext<'a> {
  pub root: &'a Path,
  pub project_name: &'a str,
  pub template: &'a Template,
  pub package_manager: Option<&'a PackageManagerInfo>,
  /// Value for `devDependencies.turbo`; `None` picks `latest` or `canary`
  pub turbo_version: Option<&'a str>,
  pub stage: &'a mut FileStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateTransform {
  OfficialStarter,
  GitIgnore,
  PackageManager,
}

impl CreateTransform {
  pub const ALL: [CreateTransform; 3] = [
    CreateTransform::OfficialStarter,
    CreateTransform::GitIgnore,
    CreateTransform::PackageManager,
  ];

  pub fn name(self) -> &'static str {
    match self {
      CreateTransform::OfficialStarter => "official-starter",
      CreateTransform::GitIgnore => "git-ignore",
      CreateTransform::PackageManager => "package-manager",
    }
  }

  pub fn apply(self, ctx: &mut CreateContext<'_>) -> TransformOutcome {
    match self {
      CreateTransform::OfficialStarter => official_starter(ctx),
      CreateTransform::GitIgnore => git_ignore(ctx),
      CreateTransform::PackageManager => package_manager(ctx),
    }
  }
}

impl fmt::Display for CreateTransform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// turbo dist-tag matching this tool's release channel
pub fn default_turbo_version() -> &'static str {
  if version::is_prerelease(env!("CARGO_PKG_VERSION")).unwrap_or(false) {
    "canary"
  } else {
    "latest"
  }
}

fn official_starter(ctx: &mut CreateContext<'_>) -> TransformOutcome {
  if ctx.stage.exists(META_JSON) {
    ctx.stage.remove(META_JSON);
  }

  let mut package_json = match ctx.stage.read_json(PACKAGE_JSON) {
    Ok(Some(value)) if value.is_object() => value,
    Ok(Some(_)) => return TransformOutcome::non_fatal("package.json is not a JSON object"),
    Ok(None) => return TransformOutcome::non_fatal("Unable to read package.json"),
    Err(e) => return TransformOutcome::non_fatal(e.to_string()),
  };

  if matches!(ctx.template, Template::Builtin)
    && let Some(obj) = package_json.as_object_mut()
  {
    obj.insert("name".to_string(), Value::String(ctx.project_name.to_string()));
  }

  let turbo: &str = match ctx.turbo_version {
    Some(version) => version,
    None => default_turbo_version(),
  };
  if let Some(dev) = package_json.get_mut("devDependencies").and_then(Value::as_object_mut)
    && dev.contains_key("turbo")
  {
    dev.insert("turbo".to_string(), Value::String(turbo.to_string()));
  }

  stage_json(ctx.stage, PACKAGE_JSON, &package_json)
}

fn git_ignore(ctx: &mut CreateContext<'_>) -> TransformOutcome {
  if ctx.stage.exists(GITIGNORE) {
    return TransformOutcome::Unmodified;
  }
  ctx.stage.write(GITIGNORE, DEFAULT_GITIGNORE);
  TransformOutcome::Success
}

#[derive(Serialize)]
struct PnpmWorkspace<'a> {
  packages: &'a [String],
}

fn package_manager(ctx: &mut CreateContext<'_>) -> TransformOutcome {
  let Some(manager) = ctx.package_manager else {
    return TransformOutcome::not_applicable("No package manager selected");
  };
  let Some(manager_version) = &manager.version else {
    return TransformOutcome::not_applicable(format!("Unable to determine the installed {} version", manager.name));
  };

  let mut package_json = match ctx.stage.read_json(PACKAGE_JSON) {
    Ok(Some(value)) if value.is_object() => value,
    Ok(_) => return TransformOutcome::non_fatal("Unable to read package.json"),
    Err(e) => return TransformOutcome::non_fatal(e.to_string()),
  };
  let Some(obj) = package_json.as_object_mut() else {
    return TransformOutcome::non_fatal("package.json is not a JSON object");
  };

  obj.insert(
    "packageManager".to_string(),
    Value::String(format!("{}@{}", manager.name, manager_version)),
  );

  // pnpm reads members from its own file, not package.json
  if manager.name == PackageManager::Pnpm
    && let Some(workspaces) = obj.shift_remove("workspaces")
  {
    let packages = workspace_patterns(&workspaces);
    match serde_yaml::to_string(&PnpmWorkspace { packages: &packages }) {
      Ok(yaml) => ctx.stage.write(PNPM_WORKSPACE, yaml),
      Err(e) => return TransformOutcome::non_fatal(format!("Unable to write {}: {}", PNPM_WORKSPACE, e)),
    }
  }

  stage_json(ctx.stage, PACKAGE_JSON, &package_json)
}

/// `workspaces` as an array or `{ "packages": [...] }`
fn workspace_patterns(value: &Value) -> Vec<String> {
  let list = value.get("packages").unwrap_or(value);
  list
    .as_array()
    .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
    .unwrap_or_default()
}

fn stage_json(stage: &mut FileStage, rel: &str, value: &Value) -> TransformOutcome {
  match stage.write_json(rel, value) {
    Ok(()) => TransformOutcome::Success,
    Err(e) => TransformOutcome::non_fatal(format!("Unable to write {}: {}", rel, e)),
  }
}
