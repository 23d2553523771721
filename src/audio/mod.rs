// Audio side of ethos: find a stream, play it, keep track of what's playing

pub mod player;
pub mod recognize;
pub mod resolver;
pub mod session;

pub use player::AudioPlayer;
pub use recognize::{Identify, RecognizeError, RecognizedSong, SongRecognizer};
pub use resolver::{AudioResolve, ResolveError, YtDlpResolver};
pub use session::{PlaybackSession, PlaybackState, SessionSnapshot};

use std::time::Duration;
use thiserror::Error;

pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to fetch audio stream: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("unsupported or corrupted audio stream: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("audio stream stalled for {0:?}")]
    Stalled(Duration),
}

/// The thing that actually makes sound. Volume is 0..=100.
#[allow(async_fn_in_trait)]
pub trait AudioEngine {
    async fn start(&mut self, url: &str, volume: u8) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn set_volume(&mut self, volume: u8);
    fn stop(&mut self);
    /// True once the current stream has run dry (or nothing was ever started).
    fn is_finished(&self) -> bool;
}

/// 0..=100 to rodio's 0.0..=1.0 gain.
pub fn volume_to_gain(volume: u8) -> f32 {
    f32::from(volume.min(MAX_VOLUME)) / f32::from(MAX_VOLUME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_to_gain() {
        assert_eq!(volume_to_gain(0), 0.0);
        assert_eq!(volume_to_gain(50), 0.5);
        assert_eq!(volume_to_gain(100), 1.0);
        assert_eq!(volume_to_gain(250), 1.0);
    }
}
