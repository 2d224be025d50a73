use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use sentinel::{ButtonConfig, ButtonId, GestureEvent, Monitor, SentinelConfig};

fn short_timers() -> SentinelConfig {
    SentinelConfig {
        buttons: ButtonConfig {
            long_press_ms: 80,
            combo_press_ms: 60,
            ..ButtonConfig::default()
        },
        ..SentinelConfig::default()
    }
}

#[test]
fn long_press_fires_from_the_worker_clock() {
    let (tx, rx) = mpsc::channel();
    let monitor = Monitor::spawn(short_timers(), tx).unwrap();
    let handle = monitor.handle();

    handle.button_down(ButtonId::VolumeDown).unwrap();
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        GestureEvent::MedicalEmergency
    );
    // Exactly once.
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    monitor.stop().unwrap();
}

#[test]
fn combo_from_two_producer_threads() {
    let (tx, rx) = mpsc::channel();
    let monitor = Monitor::spawn(short_timers(), tx).unwrap();

    let down = monitor.handle();
    let up = monitor.handle();
    thread::spawn(move || down.button_down(ButtonId::VolumeDown).unwrap())
        .join()
        .unwrap();
    thread::spawn(move || up.button_down(ButtonId::VolumeUp).unwrap())
        .join()
        .unwrap();

    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        GestureEvent::PanicAlert
    );
    monitor.stop().unwrap();
}

#[test]
fn stop_cancels_a_pending_long_press() {
    let (tx, rx) = mpsc::channel();
    let monitor = Monitor::spawn(
        SentinelConfig {
            buttons: ButtonConfig {
                long_press_ms: 200,
                ..ButtonConfig::default()
            },
            ..SentinelConfig::default()
        },
        tx,
    )
    .unwrap();

    monitor.handle().button_down(ButtonId::VolumeDown).unwrap();
    let sink = monitor.stop().unwrap();
    drop(sink);

    // The sender went away with the worker; nothing was ever sent.
    assert_eq!(rx.recv_timeout(Duration::from_millis(500)), Err(mpsc::RecvTimeoutError::Disconnected));
}

#[test]
fn spawn_rejects_invalid_config() {
    let mut config = SentinelConfig::default();
    config.shake.required_count = 0;
    assert!(Monitor::spawn(config, Vec::<GestureEvent>::new()).is_err());
}
