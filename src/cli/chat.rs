use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use lyricchain::config::Config;
use lyricchain::core::LyricEngine;

use super::{format_reply, NO_CONTINUATION};

#[derive(Args)]
pub struct ChatArgs {
    /// Override the ambient trigger probability (0-100) for this session
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    probability: Option<u8>,
}

#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Lyrics(&'a str),
    Status,
    Test,
    Message(&'a str),
}

fn parse_line(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    let mut parts = line.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();

    match head {
        "/lyrics_status" => ChatInput::Status,
        "/lyrics_test" => ChatInput::Test,
        "/lyrics" => ChatInput::Lyrics(rest),
        _ => ChatInput::Message(line),
    }
}

pub async fn execute(args: ChatArgs, mut config: Config) -> Result<()> {
    if let Some(probability) = args.probability {
        config.trigger_probability = probability;
    }

    let engine = LyricEngine::start(config)?;
    info!("Chat session started, reading messages from stdin (Ctrl-C to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => handle_line(&engine, &line).await,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        }
    }

    engine.stop().await?;
    Ok(())
}

async fn handle_line(engine: &LyricEngine, line: &str) {
    match parse_line(line) {
        ChatInput::Status => {
            let stats = engine.stats().await;
            println!("📊 Lyric engine status: running");
            println!("  🔧 version: {}", env!("CARGO_PKG_VERSION"));
            println!("  🌐 catalog: {}", stats.config.api_base_url);
            println!("  🗂️  cached songs: {}/{}", stats.entry_count, stats.config.max_cache_size);
            println!(
                "  ✅ hits: {} cache / {} remote, ❌ misses: {}",
                stats.resolver.cache_hits, stats.resolver.remote_hits, stats.resolver.misses
            );
        }
        ChatInput::Test => println!("✅ Lyric engine is up and listening"),
        ChatInput::Lyrics("") => println!("💡 Usage: /lyrics <lyric line>"),
        ChatInput::Lyrics(text) => match engine.handle_command(text).await {
            Some(hit) => println!("{}", format_reply(&hit)),
            None => println!("{}", NO_CONTINUATION),
        },
        ChatInput::Message("") => {}
        ChatInput::Message(text) => match engine.handle_message(text).await {
            Some(hit) => println!("{}", format_reply(&hit)),
            None => debug!("No reply for: {}", text),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("/lyrics_status"), ChatInput::Status);
        assert_eq!(parse_line("  /lyrics_test  "), ChatInput::Test);
        assert_eq!(parse_line("/lyrics 今天我 寒夜里"), ChatInput::Lyrics("今天我 寒夜里"));
        assert_eq!(parse_line("/lyrics"), ChatInput::Lyrics(""));
        assert_eq!(parse_line("/lyricsfoo"), ChatInput::Message("/lyricsfoo"));
        assert_eq!(parse_line("hello world"), ChatInput::Message("hello world"));
    }
}
