// Keyboard handling - crossterm key presses mapped onto what the app understands.
// Polled synchronously from the main loop; nothing reads the terminal in the background.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Quit,
    Render, // terminal resized
    Pause,
    Resume,
    VolumeUp,
    VolumeDown,
    Identify,
    Input(char),
    Backspace,
    Submit,
}

pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Wait up to `timeout` for one terminal event.
    pub fn poll(&self, timeout: Duration) -> Result<Option<AppEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        Ok(match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key_to_app_event(key),
            Event::Resize(_, _) => Some(AppEvent::Render),
            _ => None,
        })
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

pub fn key_to_app_event(key: KeyEvent) -> Option<AppEvent> {
    match (key.code, key.modifiers) {
        // Quit
        (KeyCode::Esc, _) => Some(AppEvent::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppEvent::Quit),
        (KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(AppEvent::Quit),

        // Playback controls; plain letters belong to the input line
        (KeyCode::Char('p'), KeyModifiers::CONTROL) => Some(AppEvent::Pause),
        (KeyCode::Char('r'), KeyModifiers::CONTROL) => Some(AppEvent::Resume),
        (KeyCode::F(2), _) => Some(AppEvent::Identify),

        // Volume
        (KeyCode::Up, _) => Some(AppEvent::VolumeUp),
        (KeyCode::Down, _) => Some(AppEvent::VolumeDown),

        // Editing
        (KeyCode::Enter, _) => Some(AppEvent::Submit),
        (KeyCode::Backspace, _) => Some(AppEvent::Backspace),
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) if !c.is_control() => {
            Some(AppEvent::Input(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(key_to_app_event(key(KeyCode::Esc, KeyModifiers::NONE)), Some(AppEvent::Quit));
        assert_eq!(
            key_to_app_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(AppEvent::Quit)
        );
        assert_eq!(
            key_to_app_event(key(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            Some(AppEvent::Quit)
        );
    }

    #[test]
    fn test_plain_letters_are_text_not_shortcuts() {
        assert_eq!(
            key_to_app_event(key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(AppEvent::Input('q'))
        );
        assert_eq!(
            key_to_app_event(key(KeyCode::Char('P'), KeyModifiers::SHIFT)),
            Some(AppEvent::Input('P'))
        );
        assert_eq!(
            key_to_app_event(key(KeyCode::Char('/'), KeyModifiers::NONE)),
            Some(AppEvent::Input('/'))
        );
    }

    #[test]
    fn test_playback_keys() {
        assert_eq!(
            key_to_app_event(key(KeyCode::Char('p'), KeyModifiers::CONTROL)),
            Some(AppEvent::Pause)
        );
        assert_eq!(
            key_to_app_event(key(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(AppEvent::Resume)
        );
        assert_eq!(
            key_to_app_event(key(KeyCode::Up, KeyModifiers::NONE)),
            Some(AppEvent::VolumeUp)
        );
        assert_eq!(
            key_to_app_event(key(KeyCode::Down, KeyModifiers::NONE)),
            Some(AppEvent::VolumeDown)
        );
        assert_eq!(
            key_to_app_event(key(KeyCode::F(2), KeyModifiers::NONE)),
            Some(AppEvent::Identify)
        );
    }

    #[test]
    fn test_editing_keys() {
        assert_eq!(
            key_to_app_event(key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(AppEvent::Submit)
        );
        assert_eq!(
            key_to_app_event(key(KeyCode::Backspace, KeyModifiers::NONE)),
            Some(AppEvent::Backspace)
        );
        assert_eq!(key_to_app_event(key(KeyCode::Char('x'), KeyModifiers::ALT)), None);
        assert_eq!(key_to_app_event(key(KeyCode::Tab, KeyModifiers::NONE)), None);
    }
}
