// Sentinel - Haptic Motor Driver
//
// GPIO-driven vibration motor.  Gives the wearer silent confirmation that a
// gesture was recognised without lighting up a screen.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use sentinel::GestureEvent;

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    /// One short tick per counted shake; emergencies get two long pulses.
    pub fn acknowledge(&mut self, event: &GestureEvent) {
        match event {
            GestureEvent::Shake(_) => self.buzz(Duration::from_millis(50)),
            _ => {
                self.buzz(Duration::from_millis(400));
                thread::sleep(Duration::from_millis(150));
                self.buzz(Duration::from_millis(400));
            }
        }
    }

    /// Vibrate for a custom duration (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) {
        let _ = self.pin.set_high();
        thread::sleep(duration);
        let _ = self.pin.set_low();
    }
}
