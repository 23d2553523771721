use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// One row of a search result list, shown as "N. Title by Artist".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCandidate {
    pub position: usize, // 1-based, display order
    pub title: String,
    pub artist: String,
    pub duration: Option<Duration>,
}

impl TrackCandidate {
    pub fn new(position: usize, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            position,
            title: title.into(),
            artist: artist.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl fmt::Display for TrackCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} by {}", self.position, self.title, self.artist)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackPage {
    #[serde(default)]
    pub items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistItem>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistItem {
    pub name: String,
}

impl SearchResponse {
    pub(crate) fn into_candidates(self, limit: usize) -> Vec<TrackCandidate> {
        self.tracks
            .items
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(idx, item)| {
                let artist = item
                    .artists
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let candidate = TrackCandidate::new(idx + 1, item.name, artist);
                match item.duration_ms {
                    Some(ms) => candidate.with_duration(Duration::from_millis(ms)),
                    None => candidate,
                }
            })
            .collect()
    }
}
