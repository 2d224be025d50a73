//! Sentinel distress-gesture engine.
//!
//! Classifies raw accelerometer samples and volume-button presses into
//! emergency gestures:
//!
//! - `shake`: debounced shake counting over a sliding window
//! - `buttons`: rapid-press, long-press and combo-press detection
//! - `timer`: cancelable one-shot timers with a controllable clock
//! - `engine`: one serialized context driving both classifiers into a sink
//! - `monitor`: the engine on a dedicated thread, fed through a channel
//! - `input`: GPIO level debouncing for physical buttons
//! - `trace`: recorded input traces for offline replay
//!
//! Alerting (SMS, location, history) lives behind [`DistressSink`].

pub mod buttons;
pub mod config;
pub mod engine;
pub mod events;
pub mod input;
pub mod monitor;
pub mod shake;
pub mod timer;
pub mod trace;

pub use buttons::{ButtonClassifier, ButtonConfig, ButtonTimer};
pub use config::SentinelConfig;
pub use engine::GestureEngine;
pub use events::{AlertKind, ButtonId, DistressSink, GestureEvent, Input, SensorSample};
pub use monitor::{Monitor, MonitorHandle};
pub use shake::{ShakeClassifier, ShakeConfig, ShakeSensitivity};
pub use timer::{TimerError, TimerHandle, TimerQueue, TimerService};
