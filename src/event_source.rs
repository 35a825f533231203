use anyhow::Result;
pub use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::time::Duration;

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Real terminal event source using crossterm
pub struct TerminalEventSource;

impl EventSource for TerminalEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Scripted event source for tests. Once the script runs out it answers
/// every read with `q`, so it always has an event ready.
#[derive(Debug, Default)]
pub struct ScriptedEventSource {
    events: VecDeque<Event>,
}

impl ScriptedEventSource {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// One key press per character
    pub fn from_keys(keys: &str) -> Self {
        Self::new(keys.chars().map(Self::char_key))
    }

    pub fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    pub fn char_key(c: char) -> Event {
        Self::key(KeyCode::Char(c))
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for ScriptedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(self
            .events
            .pop_front()
            .unwrap_or_else(|| Self::char_key('q')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_replayed_in_order_then_quit() {
        let mut source = ScriptedEventSource::from_keys("j+");
        assert!(source.poll(Duration::ZERO).unwrap());

        let codes: Vec<KeyCode> = (0..3)
            .map(|_| match source.read().unwrap() {
                Event::Key(key) => key.code,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();

        assert_eq!(
            codes,
            vec![KeyCode::Char('j'), KeyCode::Char('+'), KeyCode::Char('q')]
        );
        assert_eq!(source.remaining(), 0);
        assert!(source.poll(Duration::ZERO).unwrap());
    }
}
