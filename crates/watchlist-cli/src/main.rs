use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::Context;
use commands::{config, watchlist};
use std::path::PathBuf;
use watchlist_config::{Config, PathManager};
use watchlist_models::{MediaType, WatchlistItem, WatchlistKey};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchlist")]
#[command(about = "Watchlist - bookmark movies and TV shows")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Watchlist(WatchlistCommands),

    /// Inspect or initialize configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum WatchlistCommands {
    /// List bookmarked titles, most recent first
    List,

    /// Bookmark a title (no-op if it is already bookmarked)
    Add(ItemArgs),

    /// Remove a bookmarked title
    #[command(long_about = "Remove a bookmarked title by key, e.g. 'movie:603' or 'tv:1399'. Asks for confirmation unless --yes is given.")]
    Remove {
        /// Key of the title to remove (<movie|tv>:<id>)
        key: WatchlistKey,

        /// Skip the confirmation prompt
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },

    /// Bookmark a title if absent, remove it if present
    Toggle(ItemArgs),

    /// Check whether a title is bookmarked
    Check {
        /// Key of the title to check (<movie|tv>:<id>)
        key: WatchlistKey,
    },

    /// Remove every bookmarked title
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Args)]
struct ItemArgs {
    /// Identifier from the metadata source
    #[arg(long)]
    id: u64,

    /// Media type: movie or tv
    #[arg(long, value_name = "TYPE")]
    media_type: MediaType,

    /// Display title
    #[arg(long, default_value = "")]
    title: String,

    /// Relative poster image path
    #[arg(long)]
    poster_path: Option<String>,
}

impl ItemArgs {
    fn into_item(self) -> WatchlistItem {
        let item = WatchlistItem::new(self.id, self.media_type, self.title);
        match self.poster_path {
            Some(poster_path) => item.with_poster_path(poster_path),
            None => item,
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration and paths
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },

    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let path_manager = PathManager::default();
    let config_file = cli.config.clone().unwrap_or_else(|| path_manager.config_file());
    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))
        .wrap_err_with(|| format!("Failed to load config from {}", config_file.display()))?;

    logging::init_logging(cli.verbose, cli.quiet, &config.logging).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Watchlist(cmd) => watchlist::run_watchlist(cmd, &config, &path_manager, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &config, &config_file, &path_manager, &output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_command() {
        let cli = Cli::try_parse_from([
            "watchlist", "add", "--id", "603", "--media-type", "movie", "--title", "The Matrix",
        ])
        .unwrap();

        match cli.command {
            Commands::Watchlist(WatchlistCommands::Add(args)) => {
                let item = args.into_item();
                assert_eq!(item, WatchlistItem::new(603, MediaType::Movie, "The Matrix"));
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_parse_remove_key() {
        let cli = Cli::try_parse_from(["watchlist", "remove", "tv:1399", "--yes"]).unwrap();

        match cli.command {
            Commands::Watchlist(WatchlistCommands::Remove { key, yes }) => {
                assert_eq!(key, WatchlistKey::new(1399, MediaType::Tv));
                assert!(yes);
            }
            _ => panic!("expected remove command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_media_type() {
        assert!(Cli::try_parse_from(["watchlist", "check", "podcast:1"]).is_err());
        assert!(Cli::try_parse_from([
            "watchlist", "toggle", "--id", "1", "--media-type", "episode",
        ])
        .is_err());
    }
}
