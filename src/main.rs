use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use turbo_tools::commands;
use turbo_tools::core::config::ToolConfig;
use turbo_tools::core::error::{ToolError, ToolResult, print_error};
use turbo_tools::create::CreateOptions;
use turbo_tools::ignore::IgnoreOptions;
use turbo_tools::migrate::MigrateOptions;
use turbo_tools::ui;
use turbo_tools::workspace::package_manager::PackageManager;

/// Scaffold, migrate, and gate CI builds for turbo monorepos
#[derive(Parser)]
#[command(name = "turbo-tools")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = ui::styles())]
struct Cli {
  /// Print debug logs (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Migrate a repository to a newer turbo version
  Migrate {
    /// Repository root (default: current directory)
    directory: Option<PathBuf>,
    /// Run even if the working tree is dirty or not a git repository
    #[arg(long)]
    force: bool,
    /// Show what would change without writing files
    #[arg(long)]
    dry: bool,
    /// Print a diff of every changed file
    #[arg(long)]
    print: bool,
    /// Upgrade turbo after the transforms succeed
    #[arg(long)]
    install: bool,
    /// Current turbo version (default: detected)
    #[arg(long)]
    from: Option<String>,
    /// Target turbo version (default: latest published)
    #[arg(long)]
    to: Option<String>,
  },

  /// Run a single transform by name
  Transform {
    /// Transform name (see --list)
    #[arg(required_unless_present = "list")]
    name: Option<String>,
    /// Repository root (default: current directory)
    directory: Option<PathBuf>,
    /// Run even if the working tree is dirty or not a git repository
    #[arg(long)]
    force: bool,
    /// Show what would change without writing files
    #[arg(long)]
    dry: bool,
    /// Print a diff of every changed file
    #[arg(long)]
    print: bool,
    /// List available transforms
    #[arg(long)]
    list: bool,
  },

  /// Create a new monorepo
  Create {
    /// Directory to create (default: my-turborepo)
    directory: Option<PathBuf>,
    /// Package manager to use
    #[arg(short = 'm', long, value_parser = ["npm", "pnpm", "yarn", "bun"])]
    package_manager: Option<String>,
    /// Local starter directory to copy instead of the built-in starter
    #[arg(short, long)]
    example: Option<PathBuf>,
    /// turbo version for devDependencies (default: latest, or canary on pre-releases)
    #[arg(long)]
    turbo_version: Option<String>,
    /// Do not install dependencies
    #[arg(long)]
    skip_install: bool,
    /// Copy the template as-is
    #[arg(long)]
    skip_transforms: bool,
  },

  /// Exit 0 if CI can skip building a workspace, 1 if it should build
  Ignore {
    /// Workspace name (default: package.json name in the current directory)
    workspace: Option<String>,
    /// Ref to compare against when there is no previous deployment
    #[arg(long)]
    fallback: Option<String>,
    /// Task whose inputs decide which files count
    #[arg(long)]
    task: Option<String>,
  },
}

fn main() {
  let cli = Cli::parse();
  init_logger(cli.verbose);

  let cwd = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(e.into()),
  };

  let code = match run(cli.command, &cwd) {
    Ok(code) => code,
    Err(err) => handle_error(err),
  };
  std::process::exit(code);
}

fn run(command: Commands, cwd: &Path) -> ToolResult<i32> {
  match command {
    Commands::Migrate {
      directory,
      force,
      dry,
      print,
      install,
      from,
      to,
    } => {
      let root = directory.unwrap_or_else(|| cwd.to_path_buf());
      let config = ToolConfig::load(&root)?;
      let options = MigrateOptions {
        force,
        dry,
        print,
        install,
        from,
        to,
      };
      commands::run_migrate(&config, &root, options)?;
      Ok(0)
    }

    Commands::Transform {
      name,
      directory,
      force,
      dry,
      print,
      list,
    } => {
      if list {
        commands::run_transform_list()?;
        return Ok(0);
      }
      let name = name.ok_or_else(|| ToolError::message("A transform name is required"))?;
      let root = directory.unwrap_or_else(|| cwd.to_path_buf());
      let config = ToolConfig::load(&root)?;
      let options = MigrateOptions {
        force,
        dry,
        print,
        ..Default::default()
      };
      commands::run_transform(&config, &name, &root, options)?;
      Ok(0)
    }

    Commands::Create {
      directory,
      package_manager,
      example,
      turbo_version,
      skip_install,
      skip_transforms,
    } => {
      let package_manager = package_manager.map(|pm| pm.parse::<PackageManager>()).transpose()?;
      let options = CreateOptions {
        directory: directory.unwrap_or_else(|| PathBuf::from("my-turborepo")),
        package_manager,
        example,
        turbo_version,
        skip_install,
        skip_transforms,
      };
      commands::run_create(options)?;
      Ok(0)
    }

    Commands::Ignore {
      workspace,
      fallback,
      task,
    } => commands::run_ignore(
      cwd,
      IgnoreOptions {
        workspace,
        fallback,
        task,
      },
    ),
  }
}

fn init_logger(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
    .format_timestamp(None)
    .init();
}

fn handle_error(err: ToolError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
