use clap::Parser;
use tracing::debug;

use questboard::adapter::inbound::cli::command::{Cli, ColorChoice};
use questboard::adapter::inbound::cli::output::{self, OutputConfig};
use questboard::adapter::inbound::cli::{self, context};
use questboard::error::{ConfigError, Error};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    // Commands report config errors themselves; logging falls back to defaults.
    let mut logging = context::load_config(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    match cli.verbose {
        0 => {}
        1 => logging.level = "debug".into(),
        _ => logging.level = "trace".into(),
    }
    logging.init();
    debug!(config = %cli.config.display(), "questboard starting");

    if let Err(e) = cli::run(cli).await {
        debug!(error = ?e, "Command failed");
        output::error(&e.to_string());
        if matches!(e, Error::Config(ConfigError::Parse(_))) {
            output::hint("run `questboard config validate` to see where");
        }
        std::process::exit(1);
    }
}
