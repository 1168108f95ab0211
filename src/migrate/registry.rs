//! Static, ordered catalog of built-in transforms

use super::transforms::{BuiltinTransform, Transform};
use semver::Version;

/// All transforms ordered by introduced-in version, ties in declaration order
pub fn builtin() -> Vec<BuiltinTransform> {
  let mut transforms = BuiltinTransform::ALL.to_vec();
  // sort_by is stable
  transforms.sort_by(|a, b| a.introduced_in().cmp(b.introduced_in()));
  transforms
}

/// Transforms with `current < introduced_in <= target`, in run order
///
/// Empty for downgrades and for ranges no transform falls into.
pub fn select_applicable(current: &Version, target: &Version) -> Vec<BuiltinTransform> {
  builtin()
    .into_iter()
    .filter(|t| t.applies(current, target))
    .collect()
}

/// Look up a transform by name
pub fn find(name: &str) -> Option<BuiltinTransform> {
  BuiltinTransform::ALL.into_iter().find(|t| t.name() == name)
}
