//! Which git ref a CI build compares against

use crate::ui;
use serde::Serialize;
use std::fmt;

/// Why a ref was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonType {
  /// The commit of the last successful deployment
  PreviousDeploy,
  /// The parent of HEAD
  HeadRelative,
  /// The user-supplied `--fallback`
  CustomFallback,
}

impl fmt::Display for ComparisonType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ComparisonType::PreviousDeploy => write!(f, "previousDeploy"),
      ComparisonType::HeadRelative => write!(f, "headRelative"),
      ComparisonType::CustomFallback => write!(f, "customFallback"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
  #[serde(rename = "ref")]
  pub reference: String,
  #[serde(rename = "type")]
  pub kind: ComparisonType,
}

impl Comparison {
  fn new(reference: impl Into<String>, kind: ComparisonType) -> Self {
    Self {
      reference: reference.into(),
      kind,
    }
  }
}

/// Hosted-CI signals read from the environment
///
/// Empty variables count as unset.
#[derive(Debug, Clone, Default)]
pub struct CiEnvironment {
  /// `VERCEL`
  pub vercel: Option<String>,
  /// `VERCEL_GIT_PREVIOUS_SHA`
  pub previous_sha: Option<String>,
  /// `VERCEL_GIT_COMMIT_REF`, informational
  pub commit_ref: Option<String>,
}

impl CiEnvironment {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
    Self {
      vercel: get("VERCEL"),
      previous_sha: get("VERCEL_GIT_PREVIOUS_SHA"),
      commit_ref: get("VERCEL_GIT_COMMIT_REF"),
    }
  }

  pub fn is_vercel(&self) -> bool {
    self.vercel.as_deref() == Some("1")
  }

  fn branch_suffix(&self) -> String {
    self
      .commit_ref
      .as_ref()
      .map(|branch| format!(" on branch \"{}\"", branch))
      .unwrap_or_default()
  }
}

/// Pick the ref to diff against; first match wins
///
/// 1. on Vercel with a previous deployment: that deployment's commit
/// 2. on Vercel without one: the fallback, else no comparison at all
/// 3. elsewhere: the fallback when given
/// 4. otherwise `HEAD^`
///
/// An empty fallback counts as absent.
pub fn get_comparison(env: &CiEnvironment, workspace: &str, fallback: Option<&str>) -> Option<Comparison> {
  let fallback = fallback.filter(|f| !f.is_empty());

  if env.is_vercel() {
    if let Some(previous) = &env.previous_sha {
      ui::info(&format!(
        "Found previous deployment (\"{}\") for \"{}\"{}",
        previous,
        workspace,
        env.branch_suffix()
      ));
      return Some(Comparison::new(previous, ComparisonType::PreviousDeploy));
    }

    ui::info(&format!(
      "No previous deployments found for \"{}\"{}",
      workspace,
      env.branch_suffix()
    ));
    return fallback.map(|fallback| {
      ui::info(&format!("Falling back to ref {}", fallback));
      Comparison::new(fallback, ComparisonType::CustomFallback)
    });
  }

  if let Some(fallback) = fallback {
    ui::info(&format!("Using {} to compare \"{}\"", fallback, workspace));
    return Some(Comparison::new(fallback, ComparisonType::CustomFallback));
  }

  Some(Comparison::new("HEAD^", ComparisonType::HeadRelative))
}
