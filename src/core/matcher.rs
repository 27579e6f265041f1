//! Line similarity and continuation scanning
//!
//! Similarity is a Ratcliff/Obershelp ratio: the number of characters covered
//! by recursively found longest common blocks, doubled and divided by the
//! total length of both strings. A short string fully contained in the other
//! scores 1.0 straight away, which is what lets a partial lyric line match.

use std::borrow::Cow;
use std::collections::HashMap;

/// Contained substrings shorter than this go through the general ratio
const CONTAINMENT_MIN_CHARS: usize = 3;

/// Similarity in `[0, 1]` between two raw strings
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    char_similarity(&a, &b)
}

/// First line (in order) similar enough to `text`, paired with the line after it
///
/// The last line is never a candidate because nothing follows it.
pub fn scan_for_next<'a>(text: &str, lines: &'a [String], threshold: f64) -> Option<(usize, &'a str)> {
    LineMatcher::new(threshold, false).scan(text, lines)
}

/// Case-fold and drop all whitespace
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Threshold plus normalization policy, applied consistently to every comparison
#[derive(Debug, Clone, Copy)]
pub struct LineMatcher {
    threshold: f64,
    normalize: bool,
}

impl LineMatcher {
    pub fn new(threshold: f64, normalize: bool) -> Self {
        Self { threshold, normalize }
    }

    /// Key used to compare (and coalesce) queries
    pub fn prepare(&self, text: &str) -> String {
        self.prepared(text).into_owned()
    }

    /// `scan_for_next` with this matcher's threshold and normalization
    pub fn scan<'a>(&self, text: &str, lines: &'a [String]) -> Option<(usize, &'a str)> {
        if lines.len() < 2 {
            return None;
        }

        let query = self.prepared(text);
        lines
            .windows(2)
            .enumerate()
            .find(|(_, pair)| similarity(&query, &self.prepared(&pair[0])) >= self.threshold)
            .map(|(index, pair)| (index, pair[1].as_str()))
    }

    fn prepared<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.normalize {
            Cow::Owned(normalize(text))
        } else {
            Cow::Borrowed(text)
        }
    }
}

fn char_similarity(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (short, long) = if (a.len(), a) <= (b.len(), b) { (a, b) } else { (b, a) };
    if short.len() >= CONTAINMENT_MIN_CHARS && contains(long, short) {
        return 1.0;
    }

    // fixed alignment order keeps the ratio symmetric
    let matched = matching_chars(short, long);
    (2 * matched) as f64 / (a.len() + b.len()) as f64
}

fn contains(haystack: &[char], needle: &[char]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Total size of all matching blocks between `a` and `b`
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut total = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`; earliest wins ties
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // run length of the match ending at b[j], keyed by j
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_j2len = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j.checked_sub(1).and_then(|prev| j2len.get(&prev)).copied().unwrap_or(0) + 1;
                next_j2len.insert(j, k);
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        j2len = next_j2len;
    }

    (best_i, best_j, best_k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identity_and_empty() {
        for s in ["a", "ab", "hello world", "夜空中最亮的星"] {
            assert_eq!(similarity(s, s), 1.0);
            assert_eq!(similarity(s, ""), 0.0);
            assert_eq!(similarity("", s), 0.0);
        }
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn test_containment_fast_path() {
        assert_eq!(similarity("最亮的星", "夜空中最亮的星"), 1.0);
        assert_eq!(similarity("夜空中最亮的星", "最亮的星"), 1.0);
        // two characters are too short to count as a containment hit
        assert!(similarity("ab", "xxabxx") < 1.0);
    }

    #[test]
    fn test_general_ratio() {
        // classic example: abcd vs bcde share "bcd", 2*3/8
        assert!((similarity("abcd", "bcde") - 0.75).abs() < 1e-9);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("kitten sitting", "sitting kitten"),
            ("the quick brown fox", "quick brown the fox"),
            ("abxcd", "abcd"),
            ("听妈妈的话", "听妈妈说的话"),
        ];
        for (a, b) in pairs {
            assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-9, "{} / {}", a, b);
        }
    }

    #[test]
    fn test_scan_for_next_first_match_wins() {
        let song = lines(&["la la la", "first", "la la la", "second"]);
        assert_eq!(scan_for_next("la la la", &song, 0.9), Some((0, "first")));
    }

    #[test]
    fn test_scan_for_next_never_returns_last_line() {
        let song = lines(&["alpha", "beta", "gamma"]);
        assert_eq!(scan_for_next("gamma", &song, 0.9), None);
        assert_eq!(scan_for_next("beta", &song, 0.9), Some((1, "gamma")));
        assert_eq!(scan_for_next("alpha", &lines(&["alpha"]), 0.5), None);
        assert_eq!(scan_for_next("alpha", &[], 0.5), None);
    }

    #[test]
    fn test_matcher_normalizes_case_and_whitespace() {
        let song = lines(&["Hello  World", "Next Line"]);
        let normalizing = LineMatcher::new(1.0, true);
        let raw = LineMatcher::new(1.0, false);

        assert_eq!(normalizing.scan("hello world", &song), Some((0, "Next Line")));
        assert_eq!(raw.scan("hello world", &song), None);
        assert_eq!(normalize(" A b\tC "), "abc");
    }
}
