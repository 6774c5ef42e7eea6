//! CLI module graph.

pub mod command;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod output;
pub mod paths;
pub mod progress;
pub mod quests;
pub mod status;

use command::{Cli, Commands, ConfigCommand};
use progress::Direction;

use crate::error::Result;

/// Dispatch a parsed command line.
///
/// `config` subcommands work without a valid configuration; everything
/// else loads it first.
///
/// # Errors
///
/// Returns the error of the command that ran.
pub async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.as_path();
    if let Commands::Config(command) = &cli.command {
        return match command {
            ConfigCommand::Init(args) => config::execute_init(path, args.force),
            ConfigCommand::Show => config::execute_show(path),
            ConfigCommand::Validate => config::execute_validate(path),
        };
    }

    let config = context::load_config(path)?;
    match cli.command {
        Commands::Quests(args) => quests::execute_quests(&config, args).await,
        Commands::Groups(args) => quests::execute_groups(&config, args).await,
        Commands::Unlocks(args) => quests::execute_unlocks(&config, args).await,
        Commands::Complete(args) => {
            progress::execute_toggle(&config, args, Direction::Complete).await
        }
        Commands::Uncomplete(args) => {
            progress::execute_toggle(&config, args, Direction::Uncomplete).await
        }
        Commands::Level(args) => progress::execute_level(&config, args).await,
        Commands::Reset(args) => progress::execute_reset(&config, args).await,
        Commands::Sync => progress::execute_sync(&config).await,
        Commands::Status => status::execute(&config).await,
        Commands::Config(_) => Ok(()),
    }
}
