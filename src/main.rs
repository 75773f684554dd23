mod cmd;

use anyhow::Result;
use clap::Parser;
use projector_build::cli::{Cli, Command, ConfigCommand};
use projector_build::logging;
use projector_build::project::{Project, ProjectOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.global.verbose)?;

    let options = ProjectOptions {
        root: cli.global.project_dir.clone(),
        properties: cli.global.properties.clone(),
        settings: cli.global.settings.clone(),
    };

    match cli.command {
        Command::Tasks(args) => cmd::tasks::list(&Project::open(&options)?, &args),
        Command::Show(args) => cmd::tasks::show(&Project::open(&options)?, &args),
        Command::Run(args) => cmd::tasks::run(&Project::open(&options)?, &args),
        Command::Manifest(args) => {
            cmd::tasks::manifest(&Project::open(&options)?, args.role.into())
        }
        Command::Config(ConfigCommand::Show(args)) => {
            cmd::config::show(&Project::open(&options)?, &args)
        }
        // Editing settings must work even when the current file does not load.
        Command::Config(ConfigCommand::Set(args)) => cmd::config::set_value(&options, &args),
    }
}
