use clap::Parser;

pub mod archive;
pub mod cancel;
pub mod cli;
mod commands;
pub mod error;
pub mod events;
pub mod generation;
pub mod logging;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod patch;
pub mod registry;
mod templates;
pub mod util;

use cli::{Cli, Command};
use logging::{init_logging, LogConfig};

/// Parses the command line and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(
        &LogConfig::from_verbosity(cli.verbose)
            .with_format(cli.log_format)
            .with_ansi(!cli.no_color),
    );

    match cli.command {
        Command::Build(args) => commands::build::run_build(args).await,
        Command::Patch(args) => commands::patch::run_patch(args),
        Command::History => commands::history::run_history(),
    }
}
