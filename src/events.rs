//! Keyboard input decoding and key bindings.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::warn;

/// Longest single wait on the terminal, so signal flags are noticed promptly.
const SIGNAL_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Char(char),
    /// The terminal was resized.
    Resize,
    /// Ctrl-C, SIGINT or SIGTERM.
    Interrupt,
    Other,
}

/// Result of waiting for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPoll {
    Key(Key),
    Timeout,
}

/// What the render loop should do in response to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    ToggleActiveOnly,
    Relayout,
    Quit,
    Ignore,
}

/// Map a key to its binding.
pub fn action_for(key: Key) -> Action {
    match key {
        Key::Up => Action::ScrollUp,
        Key::Down => Action::ScrollDown,
        Key::Char('a') => Action::ToggleActiveOnly,
        Key::Char('q') | Key::Interrupt => Action::Quit,
        Key::Resize => Action::Relayout,
        Key::Char(_) | Key::Other => Action::Ignore,
    }
}

/// A source of key presses with a bounded wait.
pub trait InputSource: Debug {
    /// Wait up to `timeout` for a key.
    fn poll_key(&mut self, timeout: Duration) -> Result<KeyPoll>;
}

/// Decode a crossterm event. Returns `None` for events that are not input
/// (key releases, focus changes).
pub fn decode_event(event: Event) -> Option<Key> {
    match event {
        Event::Key(key) => decode_key(key),
        Event::Resize(_, _) => Some(Key::Resize),
        _ => None,
    }
}

fn decode_key(key: KeyEvent) -> Option<Key> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let decoded = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::Interrupt,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    };
    Some(decoded)
}

/// Keyboard input from the controlling terminal via crossterm.
///
/// Also watches SIGINT/SIGTERM so an external kill still exits through
/// the quit path and restores the terminal.
#[derive(Debug)]
pub struct TerminalInput {
    shutdown: Arc<AtomicBool>,
}

impl TerminalInput {
    pub fn new() -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        for signal in [SIGINT, SIGTERM] {
            if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&shutdown)) {
                warn!(signal, error = %e, "failed to register signal handler");
            }
        }
        Self { shutdown }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for TerminalInput {
    fn poll_key(&mut self, timeout: Duration) -> Result<KeyPoll> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Ok(KeyPoll::Key(Key::Interrupt));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(KeyPoll::Timeout);
            }
            if event::poll(remaining.min(SIGNAL_CHECK_INTERVAL))? {
                if let Some(key) = decode_event(event::read()?) {
                    return Ok(KeyPoll::Key(key));
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;

    use super::*;

    /// Replays a fixed list of polls, then times out forever.
    #[derive(Debug, Default)]
    pub struct ScriptedInput {
        polls: VecDeque<KeyPoll>,
    }

    impl ScriptedInput {
        pub fn new(polls: impl IntoIterator<Item = KeyPoll>) -> Self {
            Self {
                polls: polls.into_iter().collect(),
            }
        }
    }

    impl InputSource for ScriptedInput {
        fn poll_key(&mut self, _timeout: Duration) -> Result<KeyPoll> {
            Ok(self.polls.pop_front().unwrap_or(KeyPoll::Timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_bindings() {
        assert_eq!(action_for(Key::Up), Action::ScrollUp);
        assert_eq!(action_for(Key::Down), Action::ScrollDown);
        assert_eq!(action_for(Key::Char('a')), Action::ToggleActiveOnly);
        assert_eq!(action_for(Key::Char('q')), Action::Quit);
        assert_eq!(action_for(Key::Interrupt), Action::Quit);
        assert_eq!(action_for(Key::Resize), Action::Relayout);
        assert_eq!(action_for(Key::Char('x')), Action::Ignore);
        assert_eq!(action_for(Key::Other), Action::Ignore);
    }

    #[test]
    fn test_decode_keys() {
        assert_eq!(decode_event(press(KeyCode::Up, KeyModifiers::NONE)), Some(Key::Up));
        assert_eq!(
            decode_event(press(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Key::Char('q'))
        );
        assert_eq!(
            decode_event(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Key::Interrupt)
        );
        assert_eq!(decode_event(press(KeyCode::F(1), KeyModifiers::NONE)), Some(Key::Other));
        assert_eq!(decode_event(Event::Resize(100, 40)), Some(Key::Resize));
        assert_eq!(decode_event(Event::FocusGained), None);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(decode_event(Event::Key(release)), None);
    }
}
