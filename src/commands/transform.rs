//! `turbo-tools transform` - Run one codemod by name

use super::migrate::print_summary;
use crate::core::config::ToolConfig;
use crate::core::error::{ToolError, ToolResult};
use crate::migrate::{MigrateOptions, MigrationEngine, SystemHost, Transform, registry};
use std::path::Path;

pub fn run_transform(config: &ToolConfig, name: &str, directory: &Path, options: MigrateOptions) -> ToolResult<()> {
  let Some(transform) = registry::find(name) else {
    let known: Vec<_> = registry::builtin().iter().map(|t| t.name()).collect();
    return Err(ToolError::with_help(
      format!("Unknown transform '{}'", name),
      format!("Available transforms: {}", known.join(", ")),
    ));
  };

  let host = SystemHost::new(config.registry.clone());
  let report = MigrationEngine::new(&host).run_single(directory, transform, &options)?;
  print_summary(&report);
  Ok(())
}

/// Print every built-in transform in plan order
pub fn run_transform_list() -> ToolResult<()> {
  println!("📋 Available transforms:\n");
  for transform in registry::builtin() {
    println!("   {} (introduced in {})", transform.name(), transform.introduced_in());
    println!("      {}", transform.description());
  }
  Ok(())
}
