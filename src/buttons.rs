// Sentinel - Volume Button Gesture Classifier
//
// Turns down/up events from the two volume buttons into emergency gestures:
//
//   - Volume-Down pressed rapidly  → SilentEmergency
//   - Volume-Up pressed rapidly    → PoliceNeeded
//   - Volume-Down held             → MedicalEmergency (long-press timer)
//   - both buttons held together   → PanicAlert (combo timer)
//
// Rapid presses resolve synchronously on the down event, so they always win
// over the timers.  Any emission performs a full clear: both press windows
// emptied, both pressed flags dropped, every timer canceled.

use std::collections::VecDeque;

use crate::config::*;
use crate::events::{ButtonId, GestureEvent};
use crate::timer::{TimerHandle, TimerQueue, TimerService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonConfig {
    pub volume_down_rapid_count: usize,
    pub volume_up_rapid_count: usize,
    pub rapid_window_ms: u64,
    pub long_press_ms: u64,
    pub combo_press_ms: u64,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            volume_down_rapid_count: VOLUME_DOWN_RAPID_COUNT,
            volume_up_rapid_count: VOLUME_UP_RAPID_COUNT,
            rapid_window_ms: RAPID_PRESS_WINDOW_MS,
            long_press_ms: LONG_PRESS_MS,
            combo_press_ms: COMBO_PRESS_MS,
        }
    }
}

/// Which gesture a pending timer is waiting to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTimer {
    LongPress,
    ComboPress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub is_pressed: bool,
    pub press_start_ms: u64,
    /// Down-event timestamps inside the rapid-press window, oldest first.
    pub presses: VecDeque<u64>,
}

impl ButtonState {
    fn clear(&mut self) {
        self.is_pressed = false;
        self.press_start_ms = 0;
        self.presses.clear();
    }

    fn prune(&mut self, now_ms: u64, window_ms: u64) {
        while let Some(&oldest) = self.presses.front() {
            if now_ms.saturating_sub(oldest) <= window_ms {
                break;
            }
            self.presses.pop_front();
        }
    }
}

pub struct ButtonClassifier<T = TimerQueue<ButtonTimer>> {
    config: ButtonConfig,
    timers: T,
    buttons: [ButtonState; 2],
    long_press: Option<TimerHandle>,
    combo_press: Option<TimerHandle>,
    timer_failures: u64,
}

impl<T: TimerService<ButtonTimer>> ButtonClassifier<T> {
    pub fn new(config: ButtonConfig, timers: T) -> Self {
        Self {
            config,
            timers,
            buttons: Default::default(),
            long_press: None,
            combo_press: None,
            timer_failures: 0,
        }
    }

    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }

    pub fn button(&self, button: ButtonId) -> &ButtonState {
        &self.buttons[button.index()]
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Timer slots that are currently armed.
    pub fn armed(&self) -> (bool, bool) {
        (self.long_press.is_some(), self.combo_press.is_some())
    }

    /// How many times a long-press or combo timer could not be armed.
    pub fn timer_failures(&self) -> u64 {
        self.timer_failures
    }

    pub fn on_button_down(&mut self, button: ButtonId, now_ms: u64) -> Option<GestureEvent> {
        if let Some(event) = self.check_rapid_presses(button, now_ms) {
            return Some(event);
        }

        let state = &mut self.buttons[button.index()];
        if !state.is_pressed {
            state.is_pressed = true;
            state.press_start_ms = now_ms;
            if button == ButtonId::VolumeDown {
                self.long_press = self.rearm(self.long_press, ButtonTimer::LongPress);
            }
        }

        // The combo timer always restarts from the latest moment both
        // buttons became simultaneously down.
        if self.buttons[button.other().index()].is_pressed {
            self.combo_press = self.rearm(self.combo_press, ButtonTimer::ComboPress);
        }
        None
    }

    pub fn on_button_up(&mut self, button: ButtonId, _now_ms: u64) {
        let state = &mut self.buttons[button.index()];
        if !state.is_pressed {
            return;
        }
        state.is_pressed = false;

        if button == ButtonId::VolumeDown {
            if let Some(handle) = self.long_press.take() {
                self.timers.cancel(handle);
            }
        }
        if let Some(handle) = self.combo_press.take() {
            self.timers.cancel(handle);
        }
    }

    /// Deliver an expired timer. Handles that no longer own their slot
    /// (canceled or superseded while the expiry was queued) are ignored.
    pub fn on_timer_fired(&mut self, handle: TimerHandle, timer: ButtonTimer) -> Option<GestureEvent> {
        let slot = match timer {
            ButtonTimer::LongPress => &mut self.long_press,
            ButtonTimer::ComboPress => &mut self.combo_press,
        };
        if *slot != Some(handle) {
            return None;
        }
        *slot = None;

        let down = self.buttons[ButtonId::VolumeDown.index()].is_pressed;
        let up = self.buttons[ButtonId::VolumeUp.index()].is_pressed;
        let event = match timer {
            ButtonTimer::LongPress if down => GestureEvent::MedicalEmergency,
            ButtonTimer::ComboPress if down && up => GestureEvent::PanicAlert,
            _ => return None,
        };
        self.full_clear();
        Some(event)
    }

    /// Cancel every outstanding timer and drop all state. Call when
    /// monitoring stops.
    pub fn cleanup(&mut self) {
        self.full_clear();
        self.timers.cancel_all();
    }

    fn check_rapid_presses(&mut self, button: ButtonId, now_ms: u64) -> Option<GestureEvent> {
        self.buttons[button.index()].presses.push_back(now_ms);
        for state in self.buttons.iter_mut() {
            state.prune(now_ms, self.config.rapid_window_ms);
        }

        let down = self.buttons[ButtonId::VolumeDown.index()].presses.len();
        let up = self.buttons[ButtonId::VolumeUp.index()].presses.len();
        let event = if down >= self.config.volume_down_rapid_count {
            GestureEvent::SilentEmergency
        } else if up >= self.config.volume_up_rapid_count {
            GestureEvent::PoliceNeeded
        } else {
            return None;
        };
        self.full_clear();
        Some(event)
    }

    /// Cancel whatever holds the slot and arm a fresh timer for it.
    fn rearm(&mut self, current: Option<TimerHandle>, timer: ButtonTimer) -> Option<TimerHandle> {
        if let Some(handle) = current {
            self.timers.cancel(handle);
        }
        let delay = match timer {
            ButtonTimer::LongPress => self.config.long_press_ms,
            ButtonTimer::ComboPress => self.config.combo_press_ms,
        };
        match self.timers.schedule(delay, timer) {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.timer_failures += 1;
                log::warn!("{:?} detection unavailable for this press: {}", timer, e);
                None
            }
        }
    }

    fn full_clear(&mut self) {
        for handle in [self.long_press.take(), self.combo_press.take()].into_iter().flatten() {
            self.timers.cancel(handle);
        }
        for state in self.buttons.iter_mut() {
            state.clear();
        }
    }
}
