//! Semantic version parsing and comparison
//!
//! Thin layer over `semver` that tolerates the decorations tools print
//! (`v1.2.3`, trailing newlines) and maps failures to `InvalidVersion`.

use crate::core::error::{ToolError, ToolResult};
use semver::Version;
use std::cmp::Ordering;

/// Parse a version string, accepting a leading `v` and surrounding whitespace
pub fn parse(input: &str) -> ToolResult<Version> {
  let trimmed = input.trim();
  let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

  Version::parse(trimmed).map_err(|e| ToolError::InvalidVersion {
    input: input.to_string(),
    reason: e.to_string(),
  })
}

/// Compare two version strings
pub fn compare(a: &str, b: &str) -> ToolResult<Ordering> {
  Ok(parse(a)?.cmp(&parse(b)?))
}

/// Whether a version carries a pre-release tag (e.g. `1.8.0-canary.3`)
pub fn is_prerelease(input: &str) -> ToolResult<bool> {
  Ok(!parse(input)?.pre.is_empty())
}

/// Extract a concrete version from a dependency spec like `^1.2.0` or `~1.2`
///
/// Returns `None` for specs that do not pin a version (`latest`, `*`,
/// `workspace:*`, git URLs).
pub fn from_dependency_spec(spec: &str) -> Option<Version> {
  let stripped = spec.trim().trim_start_matches(['^', '~', '=', '>', '<', ' ', 'v']);
  Version::parse(stripped).ok()
}
