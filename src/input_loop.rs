// Input loop - one submitted line at a time, no queueing.
// Parses, drives search/resolve/playback, and writes the outcome into the dashboard view.

use crate::audio::{AudioEngine, AudioResolve, Identify, PlaybackSession};
use crate::command::{self, clean_hashtag, extract_song_and_artist, Command};
use crate::spotify::{TrackCandidate, TrackSearch};
use crate::ui::dashboard::{DashboardView, SharedView, ViewUpdate};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The view is shared with the app shell so it can keep drawing while a call
/// is in flight. No borrow of it is ever held across an `.await`.
pub struct InputLoop<S, R, E> {
    search: S,
    resolver: R,
    session: PlaybackSession<E>,
    view: SharedView,
    last_results: Vec<TrackCandidate>,
}

impl<S, R, E> InputLoop<S, R, E>
where
    S: TrackSearch,
    R: AudioResolve,
    E: AudioEngine,
{
    pub fn new(search: S, resolver: R, session: PlaybackSession<E>, view: DashboardView) -> Self {
        let mut input_loop = Self {
            search,
            resolver,
            session,
            view: Rc::new(RefCell::new(view)),
            last_results: Vec::new(),
        };
        input_loop.sync_view();
        input_loop
    }

    pub fn view(&self) -> Ref<'_, DashboardView> {
        self.view.borrow()
    }

    pub fn shared_view(&self) -> SharedView {
        Rc::clone(&self.view)
    }

    pub fn session(&self) -> &PlaybackSession<E> {
        &self.session
    }

    pub fn last_results(&self) -> &[TrackCandidate] {
        &self.last_results
    }

    /// Handle one submitted line. Never fails: every problem ends up in the log area.
    pub async fn submit(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        debug!("Submitted: {:?}", line);

        match command::parse(line) {
            Ok(Command::Play(query)) => self.search(&query).await,
            Ok(Command::SelectIndex(index)) => self.select(index).await,
            Ok(Command::Volume(level)) => self.set_volume(level),
            Ok(cmd @ (Command::QueueAdd(_) | Command::QueueRemove(_))) => {
                info!("Queue command ignored: {}", cmd);
                self.log(format!("{} is not supported yet", cmd.verb().unwrap_or_default()));
            }
            Err(e) => {
                debug!("Parse error for {:?}: {}", line, e);
                self.log(format!("Invalid command: {}", e));
            }
        }
    }

    async fn search(&mut self, query: &str) {
        self.log(format!("Searching for '{}'...", query));

        let results = match self.search.search(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                self.log(format!("Search failed: {}", e));
                Vec::new()
            }
        };

        if results.is_empty() {
            self.log(format!("No results for '{}'", query));
        } else {
            self.log(format!("{} results, type a number to play", results.len()));
        }

        self.view.borrow_mut().apply(ViewUpdate::ResultList(
            results.iter().map(ToString::to_string).collect(),
        ));
        self.last_results = results;
    }

    async fn select(&mut self, index: usize) {
        if self.last_results.is_empty() {
            debug!("Selection {} with no results, ignoring", index);
            return;
        }

        let Some(candidate) = index
            .checked_sub(1)
            .and_then(|i| self.last_results.get(i))
            .cloned()
        else {
            self.log(format!("No result #{} (pick 1-{})", index, self.last_results.len()));
            return;
        };

        let entry = candidate.to_string();
        let description = clean_hashtag(&entry);
        let label = match extract_song_and_artist(&entry) {
            Ok((song, artist)) => format!("{} - {}", song, artist),
            Err(e) => {
                debug!("{}", e);
                description.clone()
            }
        };

        self.log(format!("Finding audio for {}...", label));
        let url = match self.resolver.resolve(&description).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Resolve failed for '{}': {}", description, e);
                self.log(format!("Could not find audio: {}", e));
                return;
            }
        };

        // Shown before the engine starts; a failed start resets it via sync_view
        self.view.borrow_mut().start_track(label.clone(), candidate.duration);

        match self.session.play(&url, &label).await {
            Ok(()) => self.log(format!("Now playing: {}", label)),
            Err(e) => self.log(format!("Playback failed: {}", e)),
        }
        self.sync_view();
    }

    fn set_volume(&mut self, level: i64) {
        let applied = self.session.set_volume(level);
        if i64::from(applied) == level {
            self.log(format!("Volume set to {}%", applied));
        } else {
            self.log(format!("Volume {} out of range, set to {}%", level, applied));
        }
        self.sync_view();
    }

    pub fn pause(&mut self) {
        if self.session.pause() {
            self.log("Paused");
        }
        self.sync_view();
    }

    pub fn resume(&mut self) {
        if self.session.resume() {
            self.log("Resumed");
        }
        self.sync_view();
    }

    pub fn volume_up(&mut self) {
        self.session.volume_up();
        self.sync_view();
    }

    pub fn volume_down(&mut self) {
        self.session.volume_down();
        self.sync_view();
    }

    /// Called from the render timer: notices a finished stream and moves the clock.
    pub fn on_tick(&mut self, dt: Duration) {
        if self.session.poll_finished() {
            self.log("Finished");
            self.sync_view();
        }
        self.view.borrow_mut().tick(dt);
    }

    /// Recognize `query`, or the current track when no query is given.
    pub async fn identify<I: Identify>(&mut self, recognizer: &I, query: Option<&str>) {
        let target = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => q.to_string(),
            None => match self.session.current_track() {
                Some(track) => track.to_string(),
                None => {
                    self.log("Nothing is playing to identify");
                    return;
                }
            },
        };

        self.log(format!("Listening to '{}'...", target));
        match recognizer.identify(&target).await {
            Ok(Some(song)) => self.log(format!("Identified: {}", song)),
            Ok(None) => self.log("No match found"),
            Err(e) => {
                warn!("Recognition failed for '{}': {}", target, e);
                self.log(format!("Recognition failed: {}", e));
            }
        }
    }

    fn log(&self, line: impl Into<String>) {
        self.view.borrow_mut().log(line);
    }

    fn sync_view(&mut self) {
        self.view.borrow_mut().sync_playback(&self.session.snapshot());
    }
}
