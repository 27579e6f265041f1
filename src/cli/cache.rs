use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use lyricchain::config::Config;
use lyricchain::core::infrastructure::SnapshotFile;
use lyricchain::core::LyricEngine;

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommands,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cache statistics
    Stats,

    /// Remove every cached song and the snapshot file
    Clear,

    /// Show cache configuration
    Info,
}

pub async fn execute(args: CacheArgs, config: Config) -> Result<()> {
    match args.command {
        CacheCommands::Stats => {
            let store = SnapshotFile::new(&config.cache_path).read(config.max_cache_size);
            let stats = match store {
                Ok(store) => store.get_stats(),
                Err(e) => {
                    println!("📝 No usable snapshot ({})", e);
                    return Ok(());
                }
            };

            println!("📊 Cache Statistics");
            println!("══════════════════");
            println!("🗂️  Songs: {}/{}", stats.total_entries, stats.max_entries);
            println!("📝 Lyric lines: {}", stats.total_lines);
            if stats.total_entries > 0 {
                println!("📈 Lines per song: {:.1}", stats.total_lines as f64 / stats.total_entries as f64);
            }
        }

        CacheCommands::Clear => {
            info!("🗑️ Clearing cache...");
            let engine = LyricEngine::start(config)?;
            engine.clear_cache().await?;

            println!("✅ Cache cleared successfully!");
            println!("💡 Lyrics will be fetched again from the catalog on demand");
        }

        CacheCommands::Info => {
            println!("ℹ️  Cache Configuration");
            println!("═════════════════════");
            println!("📁 Snapshot: {}", config.cache_path.display());
            println!("📊 Max Songs: {}", config.max_cache_size);
            println!("🔁 Eviction: oldest first");
            println!(
                "💾 Persistence: {}",
                if config.persist_after_mutation { "after every new song" } else { "on shutdown" }
            );

            match std::fs::metadata(&config.cache_path) {
                Ok(metadata) => println!("📦 Snapshot Size: ~{} KB", metadata.len() / 1024),
                Err(_) => println!("📝 Status: Not created yet (written on first shutdown)"),
            }
        }
    }

    Ok(())
}
