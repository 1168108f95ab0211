//! Error types for turbo-tools with contextual messages and exit codes
//!
//! Every failure path in the engine resolves to a `ToolError`. Only `main`
//! turns one into a process exit code, so internal code stays testable.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for turbo-tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Run finished (including "already up to date")
  Success = 0,
  /// Any abort
  Failure = 1,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for turbo-tools
#[derive(Debug)]
pub enum ToolError {
  /// A string could not be parsed as a semantic version
  InvalidVersion { input: String, reason: String },

  /// The working tree has uncommitted changes
  DirtyWorkingTree { path: PathBuf },

  /// The current or target version could not be determined
  UnresolvableVersion { which: VersionRole, reason: Option<String> },

  /// A transform failed fatally and halted the plan
  TransformFatal {
    transform: String,
    message: String,
    /// Transforms that had already been applied before the failure
    applied: Vec<String>,
  },

  /// No upgrade command exists for the detected package manager
  UnresolvableUpgradeCommand { package_manager: Option<String> },

  /// The install/upgrade command exited unsuccessfully
  InstallCommandFailed { command: String, stderr: String },

  /// The target path is not a usable directory
  InvalidDirectory { path: PathBuf, reason: String },

  /// The target path is not inside a git repository
  NotAGitRepository { path: PathBuf },

  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

/// Which side of a migration a version belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRole {
  Current,
  Target,
}

impl fmt::Display for VersionRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionRole::Current => write!(f, "current"),
      VersionRole::Target => write!(f, "target"),
    }
  }
}

impl ToolError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ToolError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ToolError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ToolError::Message { message, context, help } => ToolError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ToolError::Io(err) => ToolError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  ///
  /// Every abort maps to 1; the variants exist for messages and tests.
  pub fn exit_code(&self) -> ExitCode {
    ExitCode::Failure
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ToolError::DirtyWorkingTree { .. } => {
        Some("Commit or stash your changes first, or pass --force to migrate anyway.".to_string())
      }
      ToolError::NotAGitRepository { .. } => {
        Some("Run the migration inside a git repository, or pass --force to skip the check.".to_string())
      }
      ToolError::UnresolvableVersion { which, .. } => match which {
        VersionRole::Current => Some("Pass the installed version explicitly with --from <version>.".to_string()),
        VersionRole::Target => Some("Pass the version to migrate to explicitly with --to <version>.".to_string()),
      },
      ToolError::TransformFatal { .. } => Some(
        "Fix the reported problem and re-run; transforms are idempotent and already-applied ones are skipped."
          .to_string(),
      ),
      ToolError::UnresolvableUpgradeCommand { .. } => Some(
        "Your repository was migrated, but turbo itself was not upgraded. Upgrade it manually with your package manager."
          .to_string(),
      ),
      ToolError::InstallCommandFailed { command, .. } => Some(format!("Re-run `{}` manually to upgrade turbo.", command)),
      ToolError::InvalidDirectory { .. } => {
        Some("migrate and transform need a directory with a package.json; create needs a new or empty directory.".to_string())
      }
      ToolError::Config(e) => e.help_message(),
      ToolError::Git(e) => e.help_message(),
      ToolError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToolError::InvalidVersion { input, reason } => {
        write!(f, "Invalid version '{}': {}", input, reason)
      }
      ToolError::DirtyWorkingTree { path } => {
        write!(f, "Git working tree at {} has uncommitted changes", path.display())
      }
      ToolError::UnresolvableVersion { which, reason } => {
        write!(f, "Unable to determine the {} version of turbo", which)?;
        if let Some(reason) = reason {
          write!(f, ": {}", reason)?;
        }
        Ok(())
      }
      ToolError::TransformFatal {
        transform,
        message,
        applied,
      } => {
        write!(f, "Transform '{}' failed: {}", transform, message)?;
        if applied.is_empty() {
          write!(f, "\nNo transforms were applied")
        } else {
          write!(f, "\nAlready applied: {}", applied.join(", "))
        }
      }
      ToolError::UnresolvableUpgradeCommand { package_manager } => match package_manager {
        Some(pm) => write!(f, "Unable to determine the upgrade command for {}", pm),
        None => write!(f, "Unable to determine the upgrade command: no package manager detected"),
      },
      ToolError::InstallCommandFailed { command, stderr } => {
        write!(f, "Install command failed: {}", command)?;
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim())?;
        }
        Ok(())
      }
      ToolError::InvalidDirectory { path, reason } => {
        write!(f, "Invalid directory {}: {}", path.display(), reason)
      }
      ToolError::NotAGitRepository { path } => {
        write!(f, "{} is not inside a git repository", path.display())
      }
      ToolError::Config(e) => write!(f, "{}", e),
      ToolError::Git(e) => write!(f, "{}", e),
      ToolError::Io(e) => write!(f, "I/O error: {}", e),
      ToolError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ToolError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ToolError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ToolError {
  fn from(err: io::Error) -> Self {
    ToolError::Io(err)
  }
}

impl From<String> for ToolError {
  fn from(msg: String) -> Self {
    ToolError::message(msg)
  }
}

impl From<&str> for ToolError {
  fn from(msg: &str) -> Self {
    ToolError::message(msg)
  }
}

impl From<serde_json::Error> for ToolError {
  fn from(err: serde_json::Error) -> Self {
    ToolError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for ToolError {
  fn from(err: serde_yaml::Error) -> Self {
    ToolError::message(format!("YAML error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ToolError {
  fn from(err: toml_edit::de::Error) -> Self {
    ToolError::Config(ConfigError::Invalid {
      reason: err.to_string(),
    })
  }
}

impl From<ureq::Error> for ToolError {
  fn from(err: ureq::Error) -> Self {
    ToolError::message(format!("Registry request failed: {}", err))
  }
}

impl From<walkdir::Error> for ToolError {
  fn from(err: walkdir::Error) -> Self {
    ToolError::message(format!("Directory walk error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for ToolError {
  fn from(err: std::path::StripPrefixError) -> Self {
    ToolError::message(format!("Path strip prefix error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ToolError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ToolError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// turbo-tools.toml could not be parsed
  Invalid { reason: String },

  /// A value is out of range or malformed
  BadValue { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { .. } => Some("Check turbo-tools.toml for syntax errors, or delete it to use defaults.".to_string()),
      ConfigError::BadValue { field, .. } => Some(format!("Fix or remove `{}` in turbo-tools.toml.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { reason } => write!(f, "Invalid turbo-tools.toml: {}", reason),
      ConfigError::BadValue { field, reason } => write!(f, "Invalid value for `{}`: {}", field, reason),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// A ref could not be resolved to an object
  RefNotFound { reference: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RefNotFound { .. } => Some(
        "The ref may be missing from a shallow clone. Fetch more history (e.g. `git fetch --unshallow`).".to_string(),
      ),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RefNotFound { reference } => {
        write!(f, "Git ref not found: {}", reference)
      }
    }
  }
}

/// Result type alias for turbo-tools
pub type ToolResult<T> = Result<T, ToolError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ToolResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ToolResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ToolError>,
{
  fn context(self, ctx: impl Into<String>) -> ToolResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ToolResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ToolError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
