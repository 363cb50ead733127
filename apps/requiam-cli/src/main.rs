//! requiam - Synchronize library patron groups from the campus directory to Grouper
//!
//! - Reconcile portal and quota groups with directory membership
//! - Move individual users between groups and record manual overrides
//! - Create new portal and quota groups
//! - Inspect the manual override tables

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use requiam_cli::commands;
use requiam_cli::logging::init_logging;
use requiam_cli::{AppConfig, CliResult, DEFAULT_CONFIG_PATH};

/// requiam - Library patron group management
#[derive(Parser)]
#[command(name = "requiam")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "REQUIAM_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile portal and quota groups with the directory
    Sync(commands::sync::SyncArgs),

    /// Move users to a portal or quota and record the override
    UserUpdate(commands::user_update::UserUpdateArgs),

    /// Create portal or quota groups
    CreateGroups(commands::create_groups::CreateGroupsArgs),

    /// Print the manual override tables
    ShowOverrides(commands::show_overrides::ShowOverridesArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = AppConfig::load(&cli.config)?;
    let log_file = init_logging(&config.logging)?;
    info!(
        config = %cli.config.display(),
        log_file = ?log_file,
        production = config.grouper.production,
        version = env!("CARGO_PKG_VERSION"),
        "requiam started"
    );

    match cli.command {
        Commands::Sync(args) => commands::sync::execute(args, &config).await,
        Commands::UserUpdate(args) => commands::user_update::execute(args, &config).await,
        Commands::CreateGroups(args) => commands::create_groups::execute(args, &config).await,
        Commands::ShowOverrides(args) => commands::show_overrides::execute(args, &config),
    }
}
