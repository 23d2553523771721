use super::dashboard::{self, SharedView};
use super::{AppEvent, EventHandler, TerminalManager};
use crate::audio::{AudioPlayer, PlaybackSession, SongRecognizer, YtDlpResolver};
use crate::config::Config;
use crate::input_loop::InputLoop;
use crate::library::Library;
use crate::spotify::SpotifyClient;
use anyhow::{Context, Result};
use std::future::Future;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

pub type PlayerLoop = InputLoop<SpotifyClient, YtDlpResolver, AudioPlayer>;

/// Work that goes out to the network or a subprocess. One at a time.
enum Job {
    Submit(String),
    Identify(Option<String>),
}

pub struct App {
    terminal: TerminalManager,
    event_handler: EventHandler,
    input_loop: PlayerLoop,
    view: SharedView,
    recognizer: SongRecognizer,
    input: String,
    clock: TickClock,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, library: &Library) -> Result<Self> {
        let timeout = config.network.timeout();

        let search =
            SpotifyClient::new(&config.spotify, timeout).context("building Spotify client")?;
        if !search.has_credentials() {
            warn!("Spotify credentials missing; /play will return no results");
        }
        let resolver = YtDlpResolver::new(&config.tools.yt_dlp, timeout);
        let recognizer = SongRecognizer::new(&config.tools.yt_dlp, &config.tools.songrec, timeout);

        let engine = AudioPlayer::new(
            config.audio.initial_volume,
            Duration::from_millis(config.audio.fade_in_ms),
            timeout,
        )
        .context("opening audio output")?;
        let session =
            PlaybackSession::new(engine, config.audio.initial_volume, config.audio.volume_step);

        let mut view = dashboard::DashboardView::new(library, config.ui.max_log_lines);
        if !search.has_credentials() {
            view.log(
                "Spotify credentials missing: set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET",
            );
        }
        view.log("Type /play <song> to search");

        // Terminal last, so a failure above leaves the shell untouched
        let terminal = TerminalManager::new()?;

        let input_loop = InputLoop::new(search, resolver, session, view);
        let view = input_loop.shared_view();
        let tick = Duration::from_millis(config.ui.tick_ms.max(10));

        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
            input_loop,
            view,
            recognizer,
            input: String::new(),
            clock: TickClock::new(tick, Instant::now()),
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Entering main loop");

        while !self.should_quit {
            self.render()?;

            // Drain everything that's queued, then fall through to the tick
            let mut timeout = self.clock.until_due(Instant::now());
            while let Some(event) = self.event_handler.poll(timeout)? {
                self.handle_event(event).await?;
                if self.should_quit {
                    break;
                }
                timeout = Duration::ZERO;
            }

            if let Some(dt) = self.clock.advance(Instant::now()) {
                self.input_loop.on_tick(dt);
            }
        }

        info!("Main loop finished");
        Ok(())
    }

    async fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Quit => self.should_quit = true,
            AppEvent::Render => {}
            AppEvent::Pause => self.input_loop.pause(),
            AppEvent::Resume => self.input_loop.resume(),
            AppEvent::VolumeUp => self.input_loop.volume_up(),
            AppEvent::VolumeDown => self.input_loop.volume_down(),
            AppEvent::Input(c) => self.input.push(c),
            AppEvent::Backspace => {
                self.input.pop();
            }
            AppEvent::Submit => {
                let line = self.input.clone();
                if !line.trim().is_empty() {
                    debug!("Submitting {:?}", line);
                    self.dispatch(Job::Submit(line)).await?;
                }
            }
            // Whatever is typed, or the current track when the field is empty
            AppEvent::Identify => {
                let query = self.input.trim().to_string();
                self.dispatch(Job::Identify((!query.is_empty()).then_some(query))).await?;
            }
        }
        Ok(())
    }

    /// Runs one job to completion while the dashboard keeps drawing and ticking.
    /// Other keys are dropped until it finishes; Quit abandons it.
    async fn dispatch(&mut self, job: Job) -> Result<()> {
        let (status, clears_input) = match &job {
            Job::Submit(_) => ("working...", true),
            Job::Identify(query) => ("listening...", query.is_some()),
        };
        self.view.borrow_mut().busy = Some(status.to_string());
        self.render()?;

        let every = self.clock.every;
        let input_loop = &mut self.input_loop;
        let recognizer = &self.recognizer;
        let work = async move {
            match job {
                Job::Submit(line) => input_loop.submit(&line).await,
                Job::Identify(query) => input_loop.identify(recognizer, query.as_deref()).await,
            }
        };

        let terminal = &mut self.terminal;
        let events = &self.event_handler;
        let input = self.input.as_str();
        let view = SharedView::clone(&self.view);
        let finished = run_while_pending(work, every, move || {
            view.borrow_mut().tick(every);
            let current = view.borrow();
            if let Err(e) = terminal.draw(|f| dashboard::render(f, &current, input)) {
                warn!("Redraw failed while busy: {}", e);
            }
            loop {
                match events.poll(Duration::ZERO) {
                    Ok(Some(AppEvent::Quit)) => return ControlFlow::Break(()),
                    Ok(Some(event)) => debug!("Ignoring {:?} while busy", event),
                    Ok(None) => return ControlFlow::Continue(()),
                    Err(e) => {
                        warn!("Event poll failed while busy: {}", e);
                        return ControlFlow::Continue(());
                    }
                }
            }
        })
        .await;

        self.view.borrow_mut().busy = None;
        match finished {
            Some(()) if clears_input => self.input.clear(),
            Some(()) => {}
            None => {
                info!("Quit while a command was in flight; abandoning it");
                self.should_quit = true;
            }
        }

        // The wait was already ticked above
        self.clock.reset(Instant::now());
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let view = self.view.borrow();
        let input = self.input.as_str();
        self.terminal.draw(|f| dashboard::render(f, &view, input))
    }
}

/// Polls `work` to completion, calling `on_tick` every `every` in between.
/// Returns `None` when `on_tick` breaks; `work` is dropped at that point.
pub(crate) async fn run_while_pending<F, T>(
    work: F,
    every: Duration,
    mut on_tick: T,
) -> Option<F::Output>
where
    F: Future,
    T: FnMut() -> ControlFlow<()>,
{
    tokio::pin!(work);
    let mut interval = time::interval_at(time::Instant::now() + every, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            out = &mut work => return Some(out),
            _ = interval.tick() => {
                if on_tick().is_break() {
                    return None;
                }
            }
        }
    }
}

/// Fixed-step clock for the progress gauge. However late a tick is noticed,
/// it moves the gauge by one step, so a long stall never shows up as a jump.
#[derive(Debug, Clone, Copy)]
struct TickClock {
    every: Duration,
    last: Instant,
}

impl TickClock {
    fn new(every: Duration, now: Instant) -> Self {
        Self { every, last: now }
    }

    fn until_due(&self, now: Instant) -> Duration {
        self.every.saturating_sub(now.saturating_duration_since(self.last))
    }

    fn advance(&mut self, now: Instant) -> Option<Duration> {
        if now.saturating_duration_since(self.last) < self.every {
            return None;
        }
        self.last = now;
        Some(self.every)
    }

    fn reset(&mut self, now: Instant) {
        self.last = now;
    }
}
