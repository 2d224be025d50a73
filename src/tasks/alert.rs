// Sentinel - Alert Task
//
// Receives classified gestures from the monitor, confirms them on the haptic
// motor and hands completed alerts to the alerting side (logged here; SMS and
// location live outside this firmware).

use std::sync::mpsc::Receiver;

use sentinel::GestureEvent;

use crate::drivers::haptic::HapticDriver;

pub fn alert_task(alert_rx: Receiver<GestureEvent>, mut haptic: HapticDriver<'static>, required_shakes: u32) {
    log::info!("Alert task started");

    while let Ok(event) = alert_rx.recv() {
        haptic.acknowledge(&event);
        if let Some(kind) = event.alert_kind(required_shakes) {
            log::warn!("ALERT {} ({})", kind, kind.code());
        }
    }

    log::warn!("Gesture channel closed, exiting alert task");
}
