use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::manifest::Role;

#[derive(Parser, Debug)]
#[command(name = "projector-build")]
#[command(version)]
#[command(about = "Build orchestration for the Projector agent and server")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Project root containing the agent and server components
    #[arg(long = "project-dir", global = true, default_value = ".")]
    pub project_dir: PathBuf,
    /// Launcher properties file (default: <project-dir>/local.properties)
    #[arg(long = "properties", global = true)]
    pub properties: Option<PathBuf>,
    /// Build settings file (default: $PROJECTOR_BUILD_CONFIG, <project-dir>/projector-build.toml, then the user config dir)
    #[arg(long = "settings", global = true)]
    pub settings: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the tasks registered for the current properties
    Tasks(TasksArgs),
    /// Show one task: dependencies, classpath and JVM arguments
    Show(ShowArgs),
    /// Run a task and everything it depends on
    Run(RunArgs),
    /// Print the jar manifest of a component
    Manifest(ManifestArgs),
    /// Inspect or edit build settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
pub struct TasksArgs {
    /// Emit JSON instead of a grouped listing
    #[arg(long = "json")]
    pub json: bool,
    /// Include build and font tasks, not only launch tasks
    #[arg(long = "all")]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Task name (e.g. runIdeWithAgent)
    pub task: String,
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task name (e.g. runServer)
    pub task: String,
    /// Print the steps without executing them
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    #[arg(value_enum)]
    pub role: RoleArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum RoleArg {
    Agent,
    Server,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Agent => Role::Agent,
            RoleArg::Server => Role::Server,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show loaded properties, launch task availability and effective settings
    Show(ConfigShowArgs),
    /// Set a key in the build settings (e.g. download.timeout_secs)
    Set(ConfigSetArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Settings key path (e.g. runtime.java_home)
    pub key: String,
    /// Value to assign; integers and booleans are stored typed, everything else as a string
    pub value: String,
    /// Override settings file path (default: <project-dir>/projector-build.toml)
    #[arg(long = "file")]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "projector-build",
            "run",
            "runServer",
            "--dry-run",
            "--project-dir",
            "/work",
            "-v",
        ])
        .unwrap();
        assert!(cli.global.verbose);
        assert_eq!(cli.global.project_dir, PathBuf::from("/work"));
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.task, "runServer");
                assert!(args.dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn manifest_role_maps_to_component_role() {
        let cli = Cli::try_parse_from(["projector-build", "manifest", "server"]).unwrap();
        match cli.command {
            Command::Manifest(args) => assert_eq!(Role::from(args.role), Role::Server),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(Role::from(RoleArg::Agent), Role::Agent);
    }
}
