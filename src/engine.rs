//! The serialized execution context for one monitoring session.
//!
//! [`GestureEngine`] owns both classifiers, the button timers, and the sink.
//! Every input first advances the timer queue to the input's timestamp, so a
//! timer that came due before the input fires before it is classified, and a
//! timer the input cancels never fires at all.

use crate::buttons::{ButtonClassifier, ButtonTimer};
use crate::config::{SentinelConfig, MAX_PENDING_TIMERS};
use crate::events::{ButtonId, DistressSink, GestureEvent, Input, SensorSample};
use crate::shake::ShakeClassifier;
use crate::timer::TimerQueue;

pub struct GestureEngine<S> {
    shake: ShakeClassifier,
    buttons: ButtonClassifier<TimerQueue<ButtonTimer>>,
    sink: S,
    shake_enabled: bool,
    buttons_enabled: bool,
    required_shakes: u32,
}

impl<S: DistressSink> GestureEngine<S> {
    pub fn new(config: &SentinelConfig, sink: S) -> Self {
        Self {
            shake: ShakeClassifier::new(config.shake),
            buttons: ButtonClassifier::new(
                config.buttons,
                TimerQueue::with_capacity(MAX_PENDING_TIMERS),
            ),
            sink,
            shake_enabled: config.shake_enabled,
            buttons_enabled: config.buttons_enabled,
            required_shakes: config.shake.required_count,
        }
    }

    pub fn handle(&mut self, input: Input) {
        match input {
            Input::Sample(sample) => self.on_sample(&sample),
            Input::ButtonDown { button, timestamp_ms } => self.on_button_down(button, timestamp_ms),
            Input::ButtonUp { button, timestamp_ms } => self.on_button_up(button, timestamp_ms),
        }
    }

    pub fn on_sample(&mut self, sample: &SensorSample) {
        self.advance_to(sample.timestamp_ms);
        if !self.shake_enabled {
            return;
        }
        if let Some(event) = self.shake.on_sample(sample) {
            self.emit(event);
        }
    }

    pub fn on_button_down(&mut self, button: ButtonId, timestamp_ms: u64) {
        self.advance_to(timestamp_ms);
        if !self.buttons_enabled {
            return;
        }
        if let Some(event) = self.buttons.on_button_down(button, timestamp_ms) {
            self.emit(event);
        }
    }

    pub fn on_button_up(&mut self, button: ButtonId, timestamp_ms: u64) {
        self.advance_to(timestamp_ms);
        if self.buttons_enabled {
            self.buttons.on_button_up(button, timestamp_ms);
        }
    }

    /// Fire every timer due at or before `now_ms`, in deadline order.
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some((handle, timer)) = self.buttons.timers_mut().pop_expired(now_ms) {
            if let Some(event) = self.buttons.on_timer_fired(handle, timer) {
                self.emit(event);
            }
        }
        self.buttons.timers_mut().advance_to(now_ms);
    }

    /// When the next timer is due, if any is armed.
    pub fn next_deadline(&self) -> Option<u64> {
        self.buttons.timers().next_deadline()
    }

    pub fn now_ms(&self) -> u64 {
        self.buttons.timers().now_ms()
    }

    /// End of the monitoring session: cancel every timer, drop all state.
    pub fn stop(&mut self) {
        self.buttons.cleanup();
        self.shake.reset();
        log::info!("gesture engine stopped at {} ms", self.now_ms());
    }

    pub fn shake(&self) -> &ShakeClassifier {
        &self.shake
    }

    pub fn buttons(&self) -> &ButtonClassifier<TimerQueue<ButtonTimer>> {
        &self.buttons
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn emit(&mut self, event: GestureEvent) {
        match event.alert_kind(self.required_shakes) {
            Some(kind) => log::info!("{:?} → {} ({})", event, kind, kind.code()),
            None => log::debug!("{:?}", event),
        }
        event.dispatch(&mut self.sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(config: SentinelConfig) -> GestureEngine<Vec<GestureEvent>> {
        GestureEngine::new(&config, Vec::new())
    }

    fn shake(t: u64) -> Input {
        Input::Sample(SensorSample::new(0.0, 30.0, 0.0, t))
    }

    #[test]
    fn timer_due_before_an_input_fires_first() {
        let mut e = engine(SentinelConfig::default());
        e.on_button_down(ButtonId::VolumeDown, 0);
        // The long press completes at 5000, before this shake is classified.
        e.handle(shake(5200));
        assert_eq!(
            e.sink(),
            &vec![GestureEvent::MedicalEmergency, GestureEvent::Shake(1)]
        );
    }

    #[test]
    fn release_at_deadline_loses_to_the_timer() {
        let mut e = engine(SentinelConfig::default());
        e.on_button_down(ButtonId::VolumeDown, 0);
        e.on_button_up(ButtonId::VolumeDown, 5000);
        assert_eq!(e.sink(), &vec![GestureEvent::MedicalEmergency]);
    }

    #[test]
    fn disabled_detectors_see_nothing() {
        let mut e = engine(SentinelConfig {
            shake_enabled: false,
            buttons_enabled: false,
            ..SentinelConfig::default()
        });
        for t in [0, 600, 1200] {
            e.handle(shake(t));
            e.on_button_down(ButtonId::VolumeUp, t);
        }
        e.on_button_down(ButtonId::VolumeDown, 2000);
        e.advance_to(60_000);
        assert!(e.sink().is_empty());
        assert_eq!(e.next_deadline(), None);
    }

    #[test]
    fn stop_cancels_pending_timers() {
        let mut e = engine(SentinelConfig::default());
        e.on_button_down(ButtonId::VolumeDown, 0);
        e.on_button_down(ButtonId::VolumeUp, 10);
        assert_eq!(e.next_deadline(), Some(3010));
        e.stop();
        assert_eq!(e.next_deadline(), None);
        e.advance_to(60_000);
        assert!(e.into_sink().is_empty());
    }
}
