use anyhow::Context;
use clap::{Parser, Subcommand};

mod cli;

use cli::*;
use lyricchain::config::Config;
use lyricchain::utils;

#[derive(Parser)]
#[command(name = "lyricchain")]
#[command(about = "Finish the lyric line someone just typed")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the line that follows the given lyric
    Resolve(resolve::ResolveArgs),

    /// Read chat messages from stdin and reply with continuations
    Chat(chat::ChatArgs),

    /// Manage the lyric cache
    Cache(cache::CacheArgs),

    /// Show configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    utils::logging::init_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Resolve(args) => resolve::execute(args, config).await,
        Commands::Chat(args) => chat::execute(args, config).await,
        Commands::Cache(args) => cache::execute(args, config).await,
        Commands::Config(args) => config::execute(args, &config, cli.config.as_deref()),
    }
}
