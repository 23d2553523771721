// Stand-ins for the network/audio collaborators, shared by unit tests
use crate::audio::{
    AudioEngine, AudioResolve, Identify, PlaybackError, RecognizeError, RecognizedSong,
    ResolveError,
};
use crate::spotify::{SearchError, TrackCandidate, TrackSearch};
use crate::ui::SharedView;
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Start(String, u8),
    Pause,
    Resume,
    Volume(u8),
    Stop,
}

#[derive(Debug, Default)]
pub struct FakeEngine {
    pub calls: Vec<EngineCall>,
    pub fail_start: bool,
    pub finished: bool,
}

impl FakeEngine {
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }
}

impl AudioEngine for FakeEngine {
    async fn start(&mut self, url: &str, volume: u8) -> Result<(), PlaybackError> {
        self.calls.push(EngineCall::Start(url.to_string(), volume));
        if self.fail_start {
            return Err(PlaybackError::Output("no audio device".into()));
        }
        self.finished = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.push(EngineCall::Pause);
    }

    fn resume(&mut self) {
        self.calls.push(EngineCall::Resume);
    }

    fn set_volume(&mut self, volume: u8) {
        self.calls.push(EngineCall::Volume(volume));
    }

    fn stop(&mut self) {
        self.calls.push(EngineCall::Stop);
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Returns canned "N. Title by Artist" rows, or an error when `fail` is set.
#[derive(Debug, Default)]
pub struct StubSearch {
    pub entries: Vec<(String, String)>,
    pub fail: bool,
    pub queries: RefCell<Vec<String>>,
    /// When set, each call records whether this view could be written mid-call
    pub watched_view: Option<SharedView>,
    pub view_writable: RefCell<Vec<bool>>,
}

impl StubSearch {
    pub fn returning(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(t, a)| (t.to_string(), a.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl TrackSearch for StubSearch {
    async fn search(&self, query: &str) -> Result<Vec<TrackCandidate>, SearchError> {
        self.queries.borrow_mut().push(query.to_string());
        if let Some(view) = &self.watched_view {
            tokio::task::yield_now().await;
            self.view_writable.borrow_mut().push(view.try_borrow_mut().is_ok());
        }
        if self.fail {
            return Err(SearchError::MissingCredentials);
        }
        Ok(self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (title, artist))| TrackCandidate::new(i + 1, title.clone(), artist.clone()))
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct StubResolver {
    pub fail: bool,
    pub requests: RefCell<Vec<String>>,
}

impl AudioResolve for StubResolver {
    async fn resolve(&self, description: &str) -> Result<String, ResolveError> {
        self.requests.borrow_mut().push(description.to_string());
        if self.fail {
            return Err(ResolveError::NoResultsFound(description.to_string()));
        }
        Ok(format!("https://audio.test/{}", description.replace(' ', "+")))
    }
}

#[derive(Debug, Default)]
pub struct StubIdentify {
    pub answer: Option<RecognizedSong>,
    pub queries: RefCell<Vec<String>>,
}

impl Identify for StubIdentify {
    async fn identify(&self, query: &str) -> Result<Option<RecognizedSong>, RecognizeError> {
        self.queries.borrow_mut().push(query.to_string());
        Ok(self.answer.clone())
    }
}
