//! Command-line interface definitions.
//!
//! Defines the CLI structure for the questboard application using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::paths;
use crate::domain::{GroupBy, QuestOrder, ViewMode};

/// Quest progress tracker
#[derive(Parser, Debug)]
#[command(name = "questboard")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List quests for one group and view mode
    Quests(QuestsArgs),

    /// Show group tabs with their counts
    Groups(GroupsArgs),

    /// Show what completing a quest would unlock
    Unlocks(QuestArg),

    /// Mark a quest completed
    Complete(ToggleArgs),

    /// Mark a quest not completed
    Uncomplete(ToggleArgs),

    /// Set the player level
    Level(LevelArgs),

    /// Reset all progress
    Reset(ResetArgs),

    /// Probe the store and deliver queued saves
    Sync,

    /// Show progress, store health and queued saves
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Grouping dimension on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GroupByArg {
    Map,
    Trader,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Map => Self::Map,
            GroupByArg::Trader => Self::Trader,
        }
    }
}

/// View mode on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ModeArg {
    #[default]
    Available,
    #[value(alias = "future")]
    Preview,
    Finished,
}

impl From<ModeArg> for ViewMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Available => Self::Available,
            ModeArg::Preview => Self::Preview,
            ModeArg::Finished => Self::Finished,
        }
    }
}

/// Ordering on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OrderArg {
    #[default]
    Catalog,
    Level,
}

impl From<OrderArg> for QuestOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Catalog => Self::Catalog,
            OrderArg::Level => Self::Level,
        }
    }
}

/// Arguments for `questboard quests`.
#[derive(Parser, Debug)]
pub struct QuestsArgs {
    /// Group to show ("All" for every group)
    #[arg(short, long, default_value = "All")]
    pub group: String,

    /// Grouping dimension (defaults to the configured one)
    #[arg(long = "by", value_enum)]
    pub group_by: Option<GroupByArg>,

    /// View mode
    #[arg(short, long, value_enum, default_value_t)]
    pub mode: ModeArg,

    /// Ordering
    #[arg(long, value_enum, default_value_t)]
    pub order: OrderArg,

    /// Also list required items
    #[arg(long)]
    pub items: bool,
}

/// Arguments for `questboard groups`.
#[derive(Parser, Debug)]
pub struct GroupsArgs {
    /// Grouping dimension (defaults to the configured one)
    #[arg(long = "by", value_enum)]
    pub group_by: Option<GroupByArg>,

    /// View mode the counts are computed for
    #[arg(short, long, value_enum, default_value_t)]
    pub mode: ModeArg,
}

/// A single quest id.
#[derive(Parser, Debug)]
pub struct QuestArg {
    /// Quest id
    pub quest: String,
}

/// Arguments for `complete` and `uncomplete`.
#[derive(Parser, Debug)]
pub struct ToggleArgs {
    /// Quest id
    pub quest: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `questboard level`.
#[derive(Parser, Debug)]
pub struct LevelArgs {
    /// New player level (at least 1)
    pub level: u32,
}

/// Arguments for `questboard reset`.
#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Subcommands for `questboard config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default configuration file
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied
    Show,
    /// Validate the configuration file
    Validate,
}

/// Arguments for `config init`.
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_quests_with_filters() {
        let cli = Cli::try_parse_from([
            "questboard", "quests", "--group", "Customs", "--by", "map", "--mode", "future",
            "--order", "level",
        ])
        .unwrap();
        match cli.command {
            Commands::Quests(args) => {
                assert_eq!(args.group, "Customs");
                assert!(matches!(args.group_by, Some(GroupByArg::Map)));
                assert_eq!(ViewMode::from(args.mode), ViewMode::Preview);
                assert_eq!(QuestOrder::from(args.order), QuestOrder::Level);
            }
            other => panic!("expected quests, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from([
            "questboard", "complete", "debut", "--yes", "--json", "-c", "/tmp/q.toml",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, PathBuf::from("/tmp/q.toml"));
        assert!(matches!(cli.command, Commands::Complete(ToggleArgs { yes: true, .. })));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["questboard", "quests", "--mode", "someday"]).is_err());
    }
}
