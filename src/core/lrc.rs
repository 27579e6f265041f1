//! LRC lyric blob cleanup
//!
//! Turns a raw timestamped lyric blob into the ordered list of sung lines:
//! timestamps removed, header tags and credit lines dropped, blanks skipped.

use once_cell::sync::Lazy;
use regex::Regex;

/// `[mm:ss]`, `[mm:ss.xx]` and `[mm:ss:xx]` anywhere in a line
static TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d{1,3}:\d{1,2}(?:[.:]\d{1,3})?\]").expect("valid timestamp regex"));

/// Whole-line header tags such as `[ar:Artist]` or `[offset:+100]`
static HEADER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[A-Za-z#]+:[^\]]*\]$").expect("valid header tag regex"));

/// Parser configured with the credit labels to drop
#[derive(Debug, Clone)]
pub struct LrcParser {
    labels: Vec<String>,
}

impl LrcParser {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn parse(&self, raw: &str) -> Vec<String> {
        parse_lrc(raw, &self.labels)
    }
}

/// Clean an LRC blob into ordered, non-empty lyric lines
pub fn parse_lrc(raw: &str, labels: &[String]) -> Vec<String> {
    raw.lines()
        .filter(|line| !HEADER_TAG.is_match(line.trim()))
        .map(|line| TIMESTAMP.replace_all(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .filter(|line| !is_credit_line(line, labels))
        .collect()
}

/// A credit line starts with a label followed by a separator, e.g. `作词：X` or `Composer: X`
///
/// Whitespace alone also separates (`作词 X`, `Lyrics by X`), except after a
/// single ASCII word, so sung lines like `Mixing it up` survive.
fn is_credit_line(line: &str, labels: &[String]) -> bool {
    labels.iter().any(|label| {
        strip_prefix_ignore_ascii_case(line, label).is_some_and(|rest| {
            let value = rest.trim_start_matches(SPACES);
            if value.starts_with([':', '：']) {
                return true;
            }
            let spaced = value.len() < rest.len() && !value.is_empty();
            spaced && (!label.is_ascii() || label.contains(' '))
        })
    })
}

const SPACES: [char; 2] = [' ', '\u{3000}'];

fn strip_prefix_ignore_ascii_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        line.get(prefix.len()..)
    } else {
        None
    }
}
