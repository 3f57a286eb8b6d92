pub mod daemon_path;
pub mod process;
pub mod view;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::start_server;
use tracing::level_filters::LevelFilter;
use view::{print_history, print_keys, print_today};

use crate::{
    daemon::start_daemon,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

const DIR_HELP: &str =
    "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state";

#[derive(Parser, Debug)]
#[command(name = "Keystats", version, long_about = None)]
#[command(about = "Daemon and viewer for keyboard and mouse usage statistics", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
    #[command(about = "Display today's keyboard and mouse totals")]
    Today {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
    #[command(about = "Display per-day totals for the recent past")]
    History {
        #[arg(long, default_value_t = 30, help = "How many days back to show")]
        days: usize,
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
    #[command(about = "Display the most pressed keys and combos")]
    Keys {
        #[arg(long, help = "Rank over all recorded time instead of today")]
        total: bool,
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    // Resolved once so logs land next to the data even under --dir.
    let dir = command_dir(&args.commands)
        .cloned()
        .map_or_else(create_application_default_path, Ok)?;
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init { .. } => start_server(dir),
        Commands::Serve { .. } => start_daemon(dir).await,
        Commands::Today { .. } => print_today(&dir).await,
        Commands::History { days, .. } => print_history(&dir, days).await,
        Commands::Keys { total, .. } => print_keys(&dir, total).await,
    }
}

fn command_dir(commands: &Commands) -> Option<&PathBuf> {
    match commands {
        Commands::Init { dir }
        | Commands::Serve { dir }
        | Commands::Today { dir }
        | Commands::History { dir, .. }
        | Commands::Keys { dir, .. } => dir.as_ref(),
    }
}
