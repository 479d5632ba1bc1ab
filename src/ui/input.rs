/// Terminal input collector.
///
/// Drains every pending crossterm event once per frame and keeps:
///   - key presses (edge-triggered; repeats and releases are dropped)
///   - left-button mouse clicks, by terminal cell
///   - the last known mouse position, for hover highlighting
///
/// Everything the card does is a discrete click, so no held-key tracking.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

pub struct InputState {
    presses: Vec<KeyEvent>,
    clicks: Vec<(u16, u16)>,
    hover: Option<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            clicks: Vec::with_capacity(4),
            hover: None,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.clicks.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.record(ev),
                Err(_) => break,
            }
        }
    }

    fn record(&mut self, ev: Event) {
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.presses.push(key),
            Event::Mouse(m) => match m.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    self.clicks.push((m.column, m.row));
                    self.hover = Some((m.column, m.row));
                }
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    self.hover = Some((m.column, m.row));
                }
                _ => {}
            },
            _ => {}
        }
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.iter().any(|k| k.code == code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Clicks this frame, in arrival order.
    pub fn clicks(&self) -> &[(u16, u16)] {
        &self.clicks
    }

    pub fn hover(&self) -> Option<(u16, u16)> {
        self.hover
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE })
    }

    #[test]
    fn only_presses_count() {
        let mut input = InputState::new();
        input.record(key(KeyCode::Char('m'), KeyEventKind::Press));
        input.record(key(KeyCode::Enter, KeyEventKind::Release));
        assert!(input.was_pressed(KeyCode::Char('m')));
        assert!(!input.was_pressed(KeyCode::Enter));
        assert!(input.any_pressed(&[KeyCode::Enter, KeyCode::Char('m')]));
    }

    #[test]
    fn clicks_and_hover_tracked() {
        let mut input = InputState::new();
        input.record(mouse(MouseEventKind::Moved, 3, 4));
        assert_eq!(input.hover(), Some((3, 4)));
        input.record(mouse(MouseEventKind::Down(MouseButton::Left), 10, 2));
        input.record(mouse(MouseEventKind::Down(MouseButton::Right), 11, 2));
        assert_eq!(input.clicks(), &[(10, 2)]);
        assert_eq!(input.hover(), Some((10, 2)));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut input = InputState::new();
        input.record(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(input.ctrl_c_pressed());
    }
}
