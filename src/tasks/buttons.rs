// Sentinel - Button Task
//
// Polls both volume buttons at ~100 Hz, debounces the raw levels and submits
// clean down/up edges to the gesture monitor.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver};

use sentinel::config::BUTTON_POLL_INTERVAL_MS;
use sentinel::input::ButtonDebouncer;
use sentinel::{ButtonId, MonitorHandle};

pub fn button_task(
    pins: [(ButtonId, PinDriver<'static, AnyIOPin, Input>); 2],
    monitor: MonitorHandle,
) {
    log::info!("Button task started");

    let mut buttons: Vec<_> = pins
        .into_iter()
        .map(|(id, pin)| (ButtonDebouncer::new(id), pin))
        .collect();
    let poll_interval = Duration::from_millis(BUTTON_POLL_INTERVAL_MS);

    loop {
        let now = monitor.now_ms();
        for (debouncer, pin) in buttons.iter_mut() {
            // Pull-up wiring: pressed reads LOW.
            if let Some(input) = debouncer.poll(pin.is_low(), now) {
                log::debug!("{:?}", input);
                if monitor.submit(input).is_err() {
                    log::warn!("Monitor stopped, exiting button task");
                    return;
                }
            }
        }
        thread::sleep(poll_interval);
    }
}
