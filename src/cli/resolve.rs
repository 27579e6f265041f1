use anyhow::Result;
use clap::Args;

use lyricchain::config::Config;
use lyricchain::core::LyricEngine;

use super::{format_reply, NO_CONTINUATION};

#[derive(Args)]
pub struct ResolveArgs {
    /// Lyric line to continue
    #[arg(value_name = "TEXT", required = true, num_args = 1..)]
    text: Vec<String>,

    /// Print the match as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ResolveArgs, config: Config) -> Result<()> {
    let engine = LyricEngine::start(config)?;
    let text = args.text.join(" ");

    let result = engine.handle_command(&text).await;
    match (&result, args.json) {
        (Some(hit), true) => println!(
            "{}",
            serde_json::json!({
                "source_line": hit.source_line,
                "next_line": hit.next_line,
                "line_index": hit.line_index,
                "song_key": hit.song_key,
                "song_name": hit.song_name,
                "artist": hit.artist,
                "provenance": hit.provenance.as_str(),
            })
        ),
        (Some(hit), false) => println!("{}", format_reply(hit)),
        (None, true) => println!("null"),
        (None, false) => println!("{}", NO_CONTINUATION),
    }

    engine.stop().await?;
    Ok(())
}
