use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use lyricchain::config::env::EnvParser;
use lyricchain::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration to the config file
    Reset,
}

pub fn execute(args: ConfigArgs, config: &Config, explicit_path: Option<&str>) -> Result<()> {
    let path = match explicit_path {
        Some(path) => PathBuf::from(path),
        None => Config::config_path()?,
    };

    match args.command {
        ConfigCommands::Show => {
            println!("🔧 Current configuration:");
            println!("  🌐 api_base_url: {}", config.api_base_url);
            println!("  🎯 similarity_threshold: {}", config.similarity_threshold);
            println!("  ✂️  min_trigger_length: {}", config.min_trigger_length);
            println!("  🗂️  max_cache_size: {}", config.max_cache_size);
            println!("  🎲 trigger_probability: {}", config.trigger_probability);
            println!("  ⏱️  request_timeout_secs: {}", config.request_timeout_secs);
            println!("  🔁 max_attempts: {}", config.max_attempts);
            println!("  🔍 search_limit: {}", config.search_limit);
            println!("  🔤 normalize_text: {}", config.normalize_text);
            println!("  ⌨️  command_prefixes: {}", config.command_prefixes.join(" "));
            println!("  🏷️  metadata_labels: {}", config.metadata_labels.join(", "));
            println!("  📁 cache_path: {}", config.cache_path.display());
            println!("  💾 persist_after_mutation: {}", config.persist_after_mutation);

            let env_vars = EnvParser::get_all_lyricchain_vars();
            if !env_vars.is_empty() {
                println!("\n🌍 Environment overrides:");
                for (key, value) in env_vars {
                    println!("  {} = {}", key, value);
                }
            }
        }

        ConfigCommands::Path => {
            println!("📁 Configuration file: {}", path.display());
            if !path.exists() {
                println!("📝 Not created yet; defaults and LYRICCHAIN_* variables apply");
            }
        }

        ConfigCommands::Reset => {
            Config::default().save(&path)?;
            println!("✅ Default configuration written to {}", path.display());
        }
    }

    Ok(())
}
