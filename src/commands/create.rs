//! `turbo-tools create` - Scaffold a new monorepo

use crate::core::error::ToolResult;
use crate::create::{self, CreateOptions};
use crate::migrate::TransformOutcome;
use std::path::Path;

pub fn run_create(options: CreateOptions) -> ToolResult<()> {
  let report = create::create(&options)?;

  for (transform, outcome) in &report.transforms {
    match outcome {
      TransformOutcome::Error { message, .. } => println!("   ⚠️  {}: {}", transform, message),
      other => log::debug!("{}: {}", transform, other),
    }
  }

  println!("\n✅ Created {} at {}", report.project.name, report.project.root.display());
  if let Some(manager) = &report.package_manager {
    println!("   Package manager: {}", manager);
  }
  if report.git_initialized {
    println!("   Initialized a git repository");
  }

  let manager = report
    .package_manager
    .as_ref()
    .map(|m| m.name.as_str())
    .unwrap_or("npm");

  println!("\n👉 Next steps:");
  if let Some(dir) = relative_dir(&report.project.root) {
    println!("   cd {}", dir);
  }
  if report.installed.is_none() {
    println!("   {} install", manager);
  }
  println!("   {} run build", manager);
  println!("   {} run dev", manager);
  Ok(())
}

/// Project path as typed relative to the working directory, when possible
fn relative_dir(root: &Path) -> Option<String> {
  let cwd = std::env::current_dir().ok()?;
  match root.strip_prefix(&cwd) {
    Ok(rel) if rel.as_os_str().is_empty() => None,
    Ok(rel) => Some(rel.display().to_string()),
    Err(_) => Some(root.display().to_string()),
  }
}
