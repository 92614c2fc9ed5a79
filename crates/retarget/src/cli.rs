//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use retarget_core::Backend;
use retarget_projects::SortField;

/// Retarget - move the projects of a solution to another .NET Framework
#[derive(Parser, Debug)]
#[command(name = "retarget")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the resolved configuration
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Path to a retarget config file (default: ~/.retarget/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Mutation backend (build-engine, host-session)
    #[arg(long, global = true)]
    pub backend: Option<Backend>,

    /// Alternative framework catalog file
    #[arg(long, global = true)]
    pub catalog: Option<Utf8PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// List the frameworks projects can be moved to
    Frameworks(FrameworksArgs),

    /// List the projects of a solution and their current framework
    Discover(DiscoverArgs),

    /// Move selected projects of a solution to a target framework
    Migrate(MigrateArgs),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Frameworks command
#[derive(Args, Debug)]
pub struct FrameworksArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Discover command
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Solution file to read projects from
    pub solution: Utf8PathBuf,

    /// Compare projects against this framework (id, value or name)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Sort by field (name, path, framework, selected, state)
    #[arg(long)]
    pub sort: Option<SortField>,

    /// Sort in descending order
    #[arg(long, requires = "sort")]
    pub descending: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Solution file to read projects from
    pub solution: Utf8PathBuf,

    /// Framework to move projects to (id, value or name)
    #[arg(short, long)]
    pub target: String,

    /// Migrate this project, by name or path (repeatable)
    #[arg(short, long = "project", value_name = "NAME", conflicts_with = "all")]
    pub projects: Vec<String>,

    /// Migrate every project with a known framework
    #[arg(long)]
    pub all: bool,

    /// Output the batch report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_migrate_args() {
        let cli = Cli::try_parse_from([
            "retarget",
            "--backend",
            "build-engine",
            "migrate",
            "App.sln",
            "--target",
            "v4.8",
            "-p",
            "Web",
            "--project",
            "Core",
        ])
        .unwrap();

        assert_eq!(cli.global.backend, Some(Backend::BuildEngine));
        match cli.command {
            Commands::Migrate(args) => {
                assert_eq!(args.solution, "App.sln");
                assert_eq!(args.target, "v4.8");
                assert_eq!(args.projects, ["Web", "Core"]);
                assert!(!args.all);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_all_conflicts_with_project() {
        let result = Cli::try_parse_from([
            "retarget", "migrate", "App.sln", "-t", "v4.8", "--all", "-p", "Web",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_sort_field() {
        let cli = Cli::try_parse_from([
            "retarget",
            "discover",
            "App.sln",
            "--sort",
            "framework",
            "--descending",
        ])
        .unwrap();
        match cli.command {
            Commands::Discover(args) => {
                assert_eq!(args.sort, Some(SortField::Framework));
                assert!(args.descending);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["retarget", "--backend", "msbuild", "frameworks"]).is_err());
    }
}
