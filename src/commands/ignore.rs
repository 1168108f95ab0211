//! `turbo-tools ignore` - Decide whether CI should build a workspace
//!
//! Exit code 0 means skip, 1 means build. The decision itself never fails.

use crate::core::error::ToolResult;
use crate::ignore::comparison::CiEnvironment;
use crate::ignore::{self, IgnoreDecision, IgnoreOptions};
use crate::ui;
use std::path::Path;

/// Run the check and return the process exit code
pub fn run_ignore(cwd: &Path, options: IgnoreOptions) -> ToolResult<i32> {
  let env = CiEnvironment::from_env();
  let decision = ignore::check(cwd, &env, &options);

  match &decision {
    IgnoreDecision::Skip { reason } => {
      ui::info(reason);
      println!("⏭️  This build can be skipped (exit 0)");
    }
    IgnoreDecision::Proceed { reason } => {
      ui::info(reason);
      println!("✓  Proceeding with the build (exit 1)");
    }
  }

  Ok(decision.exit_code())
}
