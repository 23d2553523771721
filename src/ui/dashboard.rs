// Dashboard - what the terminal shows. No logic beyond formatting and placement.
// Callers mutate the view and then redraw; nothing here diffs or refreshes on its own.

use crate::audio::SessionSnapshot;
use crate::library::Library;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub const NOTHING_PLAYING: &str = "Nothing playing";
pub const INPUT_PLACEHOLDER: &str = "/play <song>  ·  pick a result number  ·  /volume <0-100>";

const BRANDING: &str = r"        __  .__
  _____/  |_|  |__   ____  ______
_/ __ \   __\  |  \ /  _ \/  ___/
\  ___/|  | |   Y  (  <_> )___ \
 \___  >__| |___|  /\____/____  >
     \/          \/           \/";

const SUBTITLE: &str = "music-cli for cool folks";

const CAT: &str = r"                    :=*=
                  .*#-.#=
          .-+*#%%%%%*+-+#
 .=+***++#@@@@@@@@@@@@@@%.
 %#:.:#@@@@@@@@@@@@@@@@@@%=
 *#.=%@@@@@@@@@@@@+=+#@@@@%+
  #%@@@@@%#*#@@@@@%@@@@@@%%%=
   %%%@@%++*%@%#%@@@@@@%%%%%=
  .@@%%%@@@@@@#-#@@%%%%%%%@*
   %@@@%%%@@@%#= .*%%%%%@@*.
   =@@@@@%%%@@@#--%@@@@@#-
    =*%@@@@%%@@@@@@@@%%%.
      .:-*@@@@@@@@@@@@@@-
:**+       =@@@@@@%@@@@@@@-
*#.        .%@@@@@@@%%%@@@@:
=%         .#@@@@@@@@@@%%%@#
+%.       .#%@@@@@@@@@@@@%%*
.%#:     .*%@@@@@#@@%#@@@@@%=
 .+%#++*%%@@@#@@@##@*%@@@#@@-
    .----.-%@+#@@%=@+@@@*%%=
      ....:-*=:***===**+=*=:....";

/// One write to the dashboard from the input loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    LogLine(String),
    ResultList(Vec<String>),
}

/// One view, written by the input loop and read by the render loop.
pub type SharedView = Rc<RefCell<DashboardView>>;

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub current_song: String,
    pub is_playing: bool,
    pub volume: u8,
    pub log_lines: Vec<String>,
    pub search_results: Option<Vec<String>>,
    pub elapsed: Duration,
    pub track_length: Option<Duration>,
    pub playlists: Vec<String>,
    pub recents: Vec<String>,
    /// Shown in the input box title while a command is in flight
    pub busy: Option<String>,
    max_log_lines: usize,
}

impl DashboardView {
    pub fn new(library: &Library, max_log_lines: usize) -> Self {
        Self {
            current_song: NOTHING_PLAYING.to_string(),
            is_playing: false,
            volume: 0,
            log_lines: Vec::new(),
            search_results: None,
            elapsed: Duration::ZERO,
            track_length: None,
            playlists: library
                .playlists
                .iter()
                .map(|p| format!("{} ({})", p.name, p.tracks.len()))
                .collect(),
            recents: library.recents.iter().map(|r| r.display()).collect(),
            busy: None,
            max_log_lines: max_log_lines.max(1),
        }
    }

    pub fn apply(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::LogLine(line) => {
                self.log_lines.push(line);
                if self.log_lines.len() > self.max_log_lines {
                    let overflow = self.log_lines.len() - self.max_log_lines;
                    self.log_lines.drain(..overflow);
                }
            }
            ViewUpdate::ResultList(results) => self.search_results = Some(results),
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.apply(ViewUpdate::LogLine(line.into()));
    }

    /// Label and length for a track about to start. The clock restarts at zero
    /// and holds until the next `sync_playback` says the engine is running.
    pub fn start_track(&mut self, song: impl Into<String>, length: Option<Duration>) {
        self.current_song = song.into();
        self.track_length = length;
        self.elapsed = Duration::ZERO;
        self.is_playing = false;
    }

    pub fn sync_playback(&mut self, snapshot: &SessionSnapshot) {
        self.is_playing = snapshot.is_playing();
        self.volume = snapshot.volume;
        match &snapshot.current_track {
            Some(track) => self.current_song = track.clone(),
            None => self.start_track(NOTHING_PLAYING, None),
        }
    }

    /// Cosmetic clock; only moves while playing and never past the known length.
    pub fn tick(&mut self, dt: Duration) {
        if !self.is_playing {
            return;
        }
        self.elapsed += dt;
        if let Some(length) = self.track_length {
            self.elapsed = self.elapsed.min(length);
        }
    }

    pub fn progress_ratio(&self) -> f64 {
        match self.track_length {
            Some(length) if !length.is_zero() => {
                (self.elapsed.as_secs_f64() / length.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn progress_label(&self) -> String {
        match self.track_length {
            Some(length) => format!(
                "{} / {}",
                format_duration(self.elapsed.as_secs()),
                format_duration(length.as_secs())
            ),
            None => format!("{} / --:--", format_duration(self.elapsed.as_secs())),
        }
    }
}

/// Seconds as m:ss.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn render(f: &mut Frame, view: &DashboardView, input: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Clock
            Constraint::Min(10),   // Main content
            Constraint::Length(6), // Player
            Constraint::Length(3), // Command input
        ])
        .split(f.area());

    render_header(f, chunks[0]);
    render_main(f, chunks[1], view);
    render_player(f, chunks[2], view);
    render_input(f, chunks[3], input, view.busy.as_deref());
}

fn render_header(f: &mut Frame, area: Rect) {
    let now = chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string();
    let clock = Paragraph::new(now)
        .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(clock, area);
}

fn render_main(f: &mut Frame, area: Rect, view: &DashboardView) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(columns[0]);

    render_branding(f, side[0]);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(side[1]);
    render_record_list(
        f,
        lists[0],
        "Your Playlists",
        &view.playlists,
        "No playlists yet",
        Color::Blue,
    );
    render_record_list(
        f,
        lists[1],
        "Recents",
        &view.recents,
        "You have not played any song recently",
        Color::Cyan,
    );

    render_activity(f, columns[1], view);
}

fn render_branding(f: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = BRANDING
        .lines()
        .map(|l| {
            Line::styled(l, Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
        })
        .collect();
    lines.push(Line::styled(SUBTITLE, Style::default().fg(Color::Gray)));

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_record_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[String],
    empty: &str,
    border: Color,
) {
    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new(empty).style(Style::default().fg(Color::DarkGray))]
    } else {
        rows.iter().map(|r| ListItem::new(r.as_str())).collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title),
    );
    f.render_widget(list, area);
}

/// Results on top, log underneath, the cat if there's room left.
fn render_activity(f: &mut Frame, area: Rect, view: &DashboardView) {
    let cat_height = CAT.lines().count() as u16;
    let show_cat = area.height >= cat_height + 12;

    let constraints = if show_cat {
        vec![Constraint::Min(6), Constraint::Min(4), Constraint::Length(cat_height)]
    } else {
        vec![Constraint::Percentage(55), Constraint::Min(4)]
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let results: Vec<ListItem> = match &view.search_results {
        Some(results) if !results.is_empty() => results
            .iter()
            .map(|r| ListItem::new(r.as_str()).style(Style::default().fg(Color::Yellow)))
            .collect(),
        Some(_) => vec![ListItem::new("No results").style(Style::default().fg(Color::DarkGray))],
        None => vec![
            ListItem::new("Search with /play <song>").style(Style::default().fg(Color::DarkGray))
        ],
    };
    f.render_widget(
        List::new(results).block(Block::default().borders(Borders::ALL).title("Results")),
        rows[0],
    );

    // Bottom-anchored: show the newest lines that fit
    let visible = rows[1].height.saturating_sub(2) as usize;
    let start = view.log_lines.len().saturating_sub(visible);
    let log_text: Vec<Line> = view.log_lines[start..]
        .iter()
        .map(|l| Line::raw(l.as_str()))
        .collect();
    f.render_widget(
        Paragraph::new(log_text)
            .block(Block::default().borders(Borders::ALL).title("Log"))
            .wrap(Wrap { trim: true }),
        rows[1],
    );

    if show_cat {
        let cat = Paragraph::new(Text::styled(
            CAT,
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        f.render_widget(cat, rows[2]);
    }
}

fn render_player(f: &mut Frame, area: Rect, view: &DashboardView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(Color::Green))
        .title("Player");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(2)])
        .split(inner);

    let progress_color = if view.is_playing { Color::Green } else { Color::Yellow };
    let progress = Gauge::default()
        .gauge_style(Style::default().fg(progress_color).add_modifier(Modifier::BOLD))
        .ratio(view.progress_ratio())
        .label(view.progress_label());
    f.render_widget(progress, chunks[0]);

    let play_glyph = if view.is_playing { "⏸" } else { "▶" };
    let filled = usize::from(view.volume.min(100) / 10);
    let volume_bar = "█".repeat(filled);
    let volume_empty = "░".repeat(10 - filled);

    let lines = vec![
        Line::from(vec![Span::styled(
            format!("♪ {}", view.current_song),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![
            Span::styled("⏮  ", Style::default().fg(Color::Gray)),
            Span::styled(
                play_glyph,
                Style::default().fg(progress_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  ⏭", Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled("Vol: ", Style::default().fg(Color::Gray)),
            Span::styled(
                volume_bar,
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Span::styled(volume_empty, Style::default().fg(Color::DarkGray)),
            Span::raw(format!(" {}%", view.volume)),
            Span::raw(" | "),
            Span::styled("^P", Style::default().fg(Color::Yellow)),
            Span::raw(" pause "),
            Span::styled("^R", Style::default().fg(Color::Yellow)),
            Span::raw(" resume "),
            Span::styled("↑↓", Style::default().fg(Color::Yellow)),
            Span::raw(" volume "),
            Span::styled("F2", Style::default().fg(Color::Yellow)),
            Span::raw(" identify "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" quit"),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[1]);
}

fn render_input(f: &mut Frame, area: Rect, input: &str, busy: Option<&str>) {
    let title = match busy {
        Some(status) => format!("Command · {}", status),
        None => "Command".to_string(),
    };

    let line = if input.is_empty() {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::raw(input),
        ])
    };

    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(title),
    );
    f.render_widget(widget, area);

    let cursor_x = area.x + 3 + input.chars().count() as u16;
    f.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
}
