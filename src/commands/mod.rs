//! CLI commands for turbo-tools
//!
//! Each runner turns parsed arguments into a library call and prints the
//! outcome. They return `ToolResult` and leave exit codes to `main`.
//!
//! - **migrate**: upgrade a repository across turbo versions
//! - **transform**: run one codemod by name, or list them
//! - **create**: scaffold a new monorepo
//! - **ignore**: CI build-skip decision for one workspace

pub mod create;
pub mod ignore;
pub mod migrate;
pub mod transform;

pub use create::run_create;
pub use ignore::run_ignore;
pub use migrate::run_migrate;
pub use transform::{run_transform, run_transform_list};
