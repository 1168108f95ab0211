//! `turbo-tools migrate` - Upgrade a repository to a newer turbo

use crate::core::config::ToolConfig;
use crate::core::error::ToolResult;
use crate::migrate::{MigrateOptions, MigrationEngine, MigrationOutcome, MigrationReport, SystemHost};
use std::path::Path;

pub fn run_migrate(config: &ToolConfig, directory: &Path, options: MigrateOptions) -> ToolResult<()> {
  let host = SystemHost::new(config.registry.clone());
  let engine = MigrationEngine::new(&host);

  match engine.run(directory, &options)? {
    MigrationOutcome::UpToDate { .. } => {}
    MigrationOutcome::Completed(report) => print_summary(&report),
  }
  Ok(())
}

/// Closing summary shared by `migrate` and `transform`
pub(crate) fn print_summary(report: &MigrationReport) {
  let applied = report.applied();
  let errors = report.errors();

  println!();
  if report.dry {
    println!("🧪 Dry run complete: {} transform(s) would change files", applied.len());
  } else {
    println!("✨ Migration complete: {} transform(s) applied", applied.len());
  }
  for name in &applied {
    println!("   - {}", name);
  }

  if !errors.is_empty() {
    println!("\n⚠️  {} transform(s) reported errors:", errors.len());
    for (name, message) in errors {
      println!("   - {}: {}", name, message);
    }
  }
}
