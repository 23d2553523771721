// Command parsing - turns a typed line into something the input loop can act on
// "/play after hours", "/volume 50", or a bare result number like "3"

pub mod entry;

pub use entry::{clean_hashtag, extract_item_number, extract_song_and_artist, EntryError};

use std::fmt;
use std::num::IntErrorKind;
use thiserror::Error;

pub const PLAY: &str = "/play";
pub const VOLUME: &str = "/volume";
pub const QUEUE_ADD: &str = "/queue-add";
pub const QUEUE_REMOVE: &str = "/queue-remove";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(String),
    Volume(i64),
    QueueAdd(String),
    QueueRemove(String),
    /// 1-based index into the last shown result list
    SelectIndex(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected \"/command value\"")]
    InvalidCommandFormat,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("volume must be a whole number, got '{0}'")]
    InvalidVolumeValue(String),
}

impl Command {
    pub fn verb(&self) -> Option<&'static str> {
        match self {
            Command::Play(_) => Some(PLAY),
            Command::Volume(_) => Some(VOLUME),
            Command::QueueAdd(_) => Some(QUEUE_ADD),
            Command::QueueRemove(_) => Some(QUEUE_REMOVE),
            Command::SelectIndex(_) => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Play(q) | Command::QueueAdd(q) | Command::QueueRemove(q) => {
                write!(f, "{} {}", self.verb().unwrap_or_default(), q)
            }
            Command::Volume(level) => write!(f, "{} {}", VOLUME, level),
            Command::SelectIndex(n) => write!(f, "{}", n),
        }
    }
}

/// Parse one submitted line.
///
/// Splits on the first whitespace run only, so the value keeps any inner
/// spaces verbatim. No case folding or trimming beyond that split.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    if is_bare_number(line) {
        return line
            .parse()
            .map(Command::SelectIndex)
            .map_err(|_| ParseError::InvalidCommandFormat);
    }

    let (verb, value) = split_verb(line).ok_or(ParseError::InvalidCommandFormat)?;

    match verb {
        PLAY => Ok(Command::Play(value.to_string())),
        VOLUME => parse_volume(value).map(Command::Volume),
        QUEUE_ADD => Ok(Command::QueueAdd(value.to_string())),
        QUEUE_REMOVE => Ok(Command::QueueRemove(value.to_string())),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Any base-10 integer literal is accepted; ones past the i64 range saturate
/// and get clamped by the session like any other out-of-range level.
fn parse_volume(value: &str) -> Result<i64, ParseError> {
    value.parse::<i64>().or_else(|e| match e.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(ParseError::InvalidVolumeValue(value.to_string())),
    })
}

pub fn is_bare_number(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

fn split_verb(line: &str) -> Option<(&str, &str)> {
    let split_at = line.find(char::is_whitespace)?;
    let verb = &line[..split_at];
    let value = line[split_at..].trim_start();

    if verb.is_empty() || value.is_empty() {
        return None;
    }
    Some((verb, value))
}
