// Helpers for "N. Title by Artist" result entries
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("expected \"N. song by artist\", got '{0}'")]
    UnexpectedFormat(String),
}

const ARTIST_SEPARATOR: &str = " by ";

fn item_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)\.").expect("item number pattern is valid"))
}

fn item_prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\. ").expect("item prefix pattern is valid"))
}

/// Leading `digits.` of an entry, if any.
pub fn extract_item_number(entry: &str) -> Option<usize> {
    item_number_pattern()
        .captures(entry)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Strip one leading `"<digits>. "`; anything else comes back unchanged.
pub fn clean_hashtag(entry: &str) -> String {
    item_prefix_pattern().replace(entry, "").into_owned()
}

/// Split `"<digits>. <song> by <artist>"` into its parts.
///
/// The first " by " wins, so a title that itself contains " by " splits early.
pub fn extract_song_and_artist(entry: &str) -> Result<(String, String), EntryError> {
    let cleaned = clean_hashtag(entry);
    cleaned
        .split_once(ARTIST_SEPARATOR)
        .map(|(song, artist)| (song.to_string(), artist.to_string()))
        .ok_or_else(|| EntryError::UnexpectedFormat(entry.to_string()))
}
