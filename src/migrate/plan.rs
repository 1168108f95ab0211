//! Migration plans
//!
//! A plan is the ordered list of transforms selected for a version range.
//! It is immutable once computed and identified by a content hash, so the
//! same inputs always print the same plan id.

use super::registry;
use super::transforms::{BuiltinTransform, Transform};
use semver::Version;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Plan identifier (SHA256 hash of plan contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Hashed view of a plan
#[derive(Serialize)]
struct PlanContents<'a> {
  from: Option<String>,
  to: Option<String>,
  transforms: Vec<&'a str>,
}

#[derive(Debug, Clone)]
pub struct MigrationPlan {
  pub id: PlanId,
  /// Version range, `None` for a single hand-picked transform
  pub range: Option<(Version, Version)>,
  pub transforms: Vec<BuiltinTransform>,
}

impl MigrationPlan {
  /// Plan for migrating `current` → `target`
  pub fn for_range(current: &Version, target: &Version) -> Self {
    Self::new(
      Some((current.clone(), target.clone())),
      registry::select_applicable(current, target),
    )
  }

  /// Plan that runs exactly one transform
  pub fn single(transform: BuiltinTransform) -> Self {
    Self::new(None, vec![transform])
  }

  fn new(range: Option<(Version, Version)>, transforms: Vec<BuiltinTransform>) -> Self {
    let contents = PlanContents {
      from: range.as_ref().map(|(from, _)| from.to_string()),
      to: range.as_ref().map(|(_, to)| to.to_string()),
      transforms: transforms.iter().map(|t| t.name()).collect(),
    };
    let json = serde_json::to_vec(&contents).unwrap_or_default();

    Self {
      id: PlanId::from_contents(&json),
      range,
      transforms,
    }
  }

  pub fn len(&self) -> usize {
    self.transforms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.transforms.is_empty()
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    match &self.range {
      Some((from, to)) => output.push_str(&format!("📋 Plan: migrate {} → {} ({})\n", from, to, self.id)),
      None => output.push_str(&format!("📋 Plan: run transform ({})\n", self.id)),
    }

    if self.transforms.is_empty() {
      output.push_str("   No transforms apply to this version range\n");
      return output;
    }

    output.push_str(&format!("\n   Transforms ({}):\n", self.transforms.len()));
    for (i, transform) in self.transforms.iter().enumerate() {
      output.push_str(&format!(
        "   {}. {} (introduced in {})\n      {}\n",
        i + 1,
        transform.name(),
        transform.introduced_in(),
        transform.description()
      ));
    }

    output
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_plan_id_is_deterministic() {
    let a = MigrationPlan::for_range(&Version::new(1, 0, 0), &Version::new(1, 7, 0));
    let b = MigrationPlan::for_range(&Version::new(1, 0, 0), &Version::new(1, 7, 0));
    assert_eq!(a.id, b.id);
    assert_eq!(a.len(), 4);

    let c = MigrationPlan::for_range(&Version::new(1, 0, 0), &Version::new(2, 0, 0));
    assert_ne!(a.id, c.id);
  }

  #[test]
  fn test_human_readable_output() {
    let plan = MigrationPlan::for_range(&Version::new(1, 6, 0), &Version::new(2, 0, 0));
    let output = plan.to_human_readable();
    assert!(output.contains("1.6.0 → 2.0.0"));
    assert!(output.contains("1. set-default-outputs (introduced in 1.7.0)"));
    assert!(output.contains("3. rename-pipeline"));

    let empty = MigrationPlan::for_range(&Version::new(2, 0, 0), &Version::new(2, 1, 0));
    assert!(empty.is_empty());
    assert!(empty.to_human_readable().contains("No transforms apply"));
  }
}
