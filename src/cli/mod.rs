//! Command line interface
//!
//! - `resolve`: one-shot explicit lookup
//! - `chat`: stdin chat loop with ambient detection and slash commands
//! - `cache`, `config`: maintenance

pub mod cache;
pub mod chat;
pub mod config;
pub mod resolve;

use lyricchain::core::MatchResult;

pub const NO_CONTINUATION: &str = "🤔 No continuation found";

/// Chat reply for a match: the next line, with the song when known
pub fn format_reply(result: &MatchResult) -> String {
    match (&result.song_name, &result.artist) {
        (Some(name), Some(artist)) => format!("🎵 {}\n   ({} - {})", result.next_line, artist, name),
        (Some(name), None) => format!("🎵 {}\n   ({})", result.next_line, name),
        _ => format!("🎵 {}", result.next_line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricchain::core::Provenance;

    fn result(song_name: Option<&str>, artist: Option<&str>) -> MatchResult {
        MatchResult {
            source_line: "alpha".into(),
            next_line: "beta".into(),
            line_index: 0,
            song_key: "1".into(),
            song_name: song_name.map(String::from),
            artist: artist.map(String::from),
            provenance: Provenance::Remote,
        }
    }

    #[test]
    fn test_format_reply() {
        assert_eq!(format_reply(&result(None, None)), "🎵 beta");
        assert_eq!(format_reply(&result(Some("Song"), None)), "🎵 beta\n   (Song)");
        assert_eq!(format_reply(&result(Some("Song"), Some("Band"))), "🎵 beta\n   (Band - Song)");
    }
}
