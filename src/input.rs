// Sentinel - Raw Button Level Debouncer
//
// Turns the raw pressed/released level of a button, polled at ~100 Hz, into
// clean down/up edges.  A level change only counts once the reading has been
// stable for the debounce interval, so contact bounce never reaches the
// gesture classifier as a burst of rapid presses.

use crate::config::BUTTON_DEBOUNCE_MS;
use crate::events::{ButtonId, Input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Down,
    Up,
}

#[derive(Debug, Clone)]
pub struct ButtonDebouncer {
    button: ButtonId,
    debounce_ms: u64,

    // Debounce state
    last_raw: bool,
    last_change_ms: u64,

    // Last level reported downstream
    pressed: bool,
}

impl ButtonDebouncer {
    pub fn new(button: ButtonId) -> Self {
        Self::with_debounce(button, BUTTON_DEBOUNCE_MS)
    }

    pub fn with_debounce(button: ButtonId, debounce_ms: u64) -> Self {
        Self {
            button,
            debounce_ms,
            last_raw: false,
            last_change_ms: 0,
            pressed: false,
        }
    }

    pub fn button(&self) -> ButtonId {
        self.button
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed one raw reading (`true` = pressed). Returns an edge once the
    /// new level has held for the debounce interval.
    pub fn update(&mut self, raw_pressed: bool, now_ms: u64) -> Option<ButtonEdge> {
        if raw_pressed != self.last_raw {
            self.last_change_ms = now_ms;
            self.last_raw = raw_pressed;
        }

        if now_ms.saturating_sub(self.last_change_ms) < self.debounce_ms {
            // Signal still bouncing.
            return None;
        }

        match (raw_pressed, self.pressed) {
            (true, false) => {
                self.pressed = true;
                Some(ButtonEdge::Down)
            }
            (false, true) => {
                self.pressed = false;
                Some(ButtonEdge::Up)
            }
            _ => None,
        }
    }

    /// Like [`update`](Self::update), but yields a classifier input stamped
    /// with the time the level actually changed.
    pub fn poll(&mut self, raw_pressed: bool, now_ms: u64) -> Option<Input> {
        let edge = self.update(raw_pressed, now_ms)?;
        let timestamp_ms = self.last_change_ms;
        Some(match edge {
            ButtonEdge::Down => Input::ButtonDown { button: self.button, timestamp_ms },
            ButtonEdge::Up => Input::ButtonUp { button: self.button, timestamp_ms },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounce_collapses_into_one_press() {
        let mut d = ButtonDebouncer::new(ButtonId::VolumeDown);
        let mut edges = Vec::new();
        // Contact bounce for 30 ms, then a solid hold.
        for (t, level) in [(0, true), (10, false), (20, true), (30, false), (40, true)] {
            edges.extend(d.update(level, t));
        }
        for t in (50..200).step_by(10) {
            edges.extend(d.update(true, t));
        }
        assert_eq!(edges, vec![ButtonEdge::Down]);
        assert!(d.is_pressed());
    }

    #[test]
    fn release_reports_up_after_stable_interval() {
        let mut d = ButtonDebouncer::new(ButtonId::VolumeUp);
        let mut inputs = Vec::new();
        for t in (0..=100).step_by(10) {
            inputs.extend(d.poll(true, t));
        }
        for t in (110..=300).step_by(10) {
            inputs.extend(d.poll(false, t));
        }
        assert_eq!(
            inputs,
            vec![
                Input::ButtonDown { button: ButtonId::VolumeUp, timestamp_ms: 0 },
                Input::ButtonUp { button: ButtonId::VolumeUp, timestamp_ms: 110 },
            ]
        );
    }

    #[test]
    fn short_glitch_is_ignored() {
        let mut d = ButtonDebouncer::new(ButtonId::VolumeDown);
        assert_eq!(d.update(true, 100), None);
        assert_eq!(d.update(false, 120), None);
        for t in (130..400).step_by(10) {
            assert_eq!(d.update(false, t), None);
        }
        assert!(!d.is_pressed());
    }
}
