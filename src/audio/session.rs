use super::{AudioEngine, PlaybackError, MAX_VOLUME};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Read-only copy of the session for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub volume: u8,
    pub current_track: Option<String>,
}

impl SessionSnapshot {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

/// Stopped -> Playing <-> Paused, plus a volume that survives track changes.
///
/// `pause()` when not playing and `resume()` when not paused are no-ops that
/// return `false`. Volume requests are clamped to 0..=100.
pub struct PlaybackSession<E> {
    engine: E,
    state: PlaybackState,
    volume: u8,
    volume_step: u8,
    current_track: Option<String>,
}

impl<E: AudioEngine> PlaybackSession<E> {
    pub fn new(engine: E, initial_volume: u8, volume_step: u8) -> Self {
        Self {
            engine,
            state: PlaybackState::Stopped,
            volume: initial_volume.min(MAX_VOLUME),
            volume_step,
            current_track: None,
        }
    }

    pub async fn play(&mut self, url: &str, track: &str) -> Result<(), PlaybackError> {
        self.current_track = Some(track.to_string());
        self.state = PlaybackState::Playing;

        match self.engine.start(url, self.volume).await {
            Ok(()) => {
                info!("Playing '{}'", track);
                Ok(())
            }
            Err(e) => {
                warn!("Engine failed to start '{}': {}", track, e);
                self.engine.stop();
                self.state = PlaybackState::Stopped;
                self.current_track = None;
                Err(e)
            }
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            debug!("pause ignored in state {:?}", self.state);
            return false;
        }
        self.engine.pause();
        self.state = PlaybackState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != PlaybackState::Paused {
            debug!("resume ignored in state {:?}", self.state);
            return false;
        }
        self.engine.resume();
        self.state = PlaybackState::Playing;
        true
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.state = PlaybackState::Stopped;
        self.current_track = None;
    }

    /// Clamp into 0..=100 and apply. Returns the volume actually set.
    pub fn set_volume(&mut self, level: i64) -> u8 {
        let clamped = level.clamp(0, i64::from(MAX_VOLUME)) as u8;
        self.volume = clamped;
        self.engine.set_volume(clamped);
        clamped
    }

    pub fn volume_up(&mut self) -> u8 {
        self.set_volume(i64::from(self.volume) + i64::from(self.volume_step))
    }

    pub fn volume_down(&mut self) -> u8 {
        self.set_volume(i64::from(self.volume) - i64::from(self.volume_step))
    }

    /// Drop back to Stopped when the engine ran out of audio. True if that happened.
    pub fn poll_finished(&mut self) -> bool {
        if self.state == PlaybackState::Playing && self.engine.is_finished() {
            info!("Finished '{}'", self.current_track.as_deref().unwrap_or_default());
            self.stop();
            return true;
        }
        false
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn current_track(&self) -> Option<&str> {
        self.current_track.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            volume: self.volume,
            current_track: self.current_track.clone(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub(crate) fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, FakeEngine};

    fn session() -> PlaybackSession<FakeEngine> {
        PlaybackSession::new(FakeEngine::default(), 50, 5)
    }

    #[tokio::test]
    async fn test_play_starts_engine_at_current_volume() {
        let mut s = session();
        s.set_volume(30);
        s.play("https://cdn.test/a.m4a", "After Hours - The Weeknd").await.unwrap();

        assert_eq!(s.state(), PlaybackState::Playing);
        assert_eq!(s.current_track(), Some("After Hours - The Weeknd"));
        assert!(s
            .engine()
            .calls
            .contains(&EngineCall::Start("https://cdn.test/a.m4a".into(), 30)));
    }

    #[tokio::test]
    async fn test_pause_then_resume_restores_playing() {
        let mut s = session();
        s.play("u", "Song - Artist").await.unwrap();
        let before = s.snapshot();

        assert!(s.pause());
        assert_eq!(s.state(), PlaybackState::Paused);
        assert!(!s.snapshot().is_playing());

        assert!(s.resume());
        assert_eq!(s.snapshot(), before);
        assert!(s.is_playing());
    }

    #[tokio::test]
    async fn test_pause_twice_is_noop() {
        let mut s = session();
        s.play("u", "t").await.unwrap();
        assert!(s.pause());
        assert!(!s.pause());
        assert_eq!(s.state(), PlaybackState::Paused);
        assert_eq!(
            s.engine().calls.iter().filter(|c| **c == EngineCall::Pause).count(),
            1
        );
    }

    #[test]
    fn test_pause_and_resume_when_stopped_do_nothing() {
        let mut s = session();
        assert!(!s.pause());
        assert!(!s.resume());
        assert_eq!(s.state(), PlaybackState::Stopped);
        assert!(s.engine().calls.is_empty());
    }

    #[tokio::test]
    async fn test_resume_while_playing_is_noop() {
        let mut s = session();
        s.play("u", "t").await.unwrap();
        assert!(!s.resume());
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_volume_clamps_and_stays_clamped() {
        let mut s = session();
        assert_eq!(s.set_volume(150), 100);
        assert_eq!(s.set_volume(-20), 0);

        s.set_volume(90);
        for _ in 0..10 {
            s.volume_up();
            assert!(s.volume() <= 100);
        }
        assert_eq!(s.volume(), 100);

        for _ in 0..30 {
            s.volume_down();
        }
        assert_eq!(s.volume(), 0);
    }

    #[tokio::test]
    async fn test_volume_persists_across_tracks() {
        let mut s = session();
        s.set_volume(42);
        s.play("first", "one").await.unwrap();
        s.play("second", "two").await.unwrap();

        assert_eq!(s.volume(), 42);
        assert!(s.engine().calls.contains(&EngineCall::Start("second".into(), 42)));
    }

    #[tokio::test]
    async fn test_engine_failure_falls_back_to_stopped() {
        let mut s = PlaybackSession::new(FakeEngine::failing(), 50, 5);
        let err = s.play("u", "Broken - Track").await.unwrap_err();

        assert!(matches!(err, PlaybackError::Output(_)));
        assert_eq!(s.state(), PlaybackState::Stopped);
        assert_eq!(s.current_track(), None);
    }

    #[tokio::test]
    async fn test_finished_stream_stops_session() {
        let mut s = session();
        s.play("u", "t").await.unwrap();
        assert!(!s.poll_finished());

        s.engine.finished = true;
        assert!(s.poll_finished());
        assert_eq!(s.state(), PlaybackState::Stopped);
        assert_eq!(s.current_track(), None);
        assert!(!s.poll_finished());
    }
}
