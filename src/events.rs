// Sentinel - Inputs, Gesture Events & the Distress Sink

use std::fmt;
use std::sync::mpsc::Sender;

// ---------------------------------------------------------------------------
// Sensor Data (3-axis accelerometer reading, m/s²)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub timestamp_ms: u64,
}

impl SensorSample {
    pub fn new(x: f32, y: f32, z: f32, timestamp_ms: u64) -> Self {
        Self { x, y, z, timestamp_ms }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    VolumeDown,
    VolumeUp,
}

impl ButtonId {
    pub const ALL: [ButtonId; 2] = [ButtonId::VolumeDown, ButtonId::VolumeUp];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::VolumeDown => 0,
            Self::VolumeUp => 1,
        }
    }

    /// The button a combo press pairs this one with.
    pub fn other(self) -> Self {
        match self {
            Self::VolumeDown => Self::VolumeUp,
            Self::VolumeUp => Self::VolumeDown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VolumeDown => "volume-down",
            Self::VolumeUp => "volume-up",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "volume-down" | "down" | "vol-down" => Some(Self::VolumeDown),
            "volume-up" | "up" | "vol-up" => Some(Self::VolumeUp),
            _ => None,
        }
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Raw input stream, in delivery order
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Sample(SensorSample),
    ButtonDown { button: ButtonId, timestamp_ms: u64 },
    ButtonUp { button: ButtonId, timestamp_ms: u64 },
}

impl Input {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            Self::Sample(sample) => sample.timestamp_ms,
            Self::ButtonDown { timestamp_ms, .. } | Self::ButtonUp { timestamp_ms, .. } => {
                *timestamp_ms
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Classified gestures
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// A qualifying shake; carries the running count within the window.
    Shake(u32),
    /// Volume-Down pressed rapidly.
    SilentEmergency,
    /// Volume-Up pressed rapidly.
    PoliceNeeded,
    /// Volume-Down held.
    MedicalEmergency,
    /// Both buttons held together.
    PanicAlert,
}

impl GestureEvent {
    /// The alert this gesture should raise, if any. Intermediate shake counts
    /// below `required_shakes` raise nothing.
    pub fn alert_kind(&self, required_shakes: u32) -> Option<AlertKind> {
        match *self {
            Self::Shake(count) if count >= required_shakes => Some(AlertKind::General),
            Self::Shake(_) => None,
            Self::SilentEmergency => Some(AlertKind::Silent),
            Self::PoliceNeeded => Some(AlertKind::Police),
            Self::MedicalEmergency => Some(AlertKind::Medical),
            Self::PanicAlert => Some(AlertKind::Panic),
        }
    }

    /// Deliver this event to the matching sink method.
    pub fn dispatch<S: DistressSink + ?Sized>(self, sink: &mut S) {
        match self {
            Self::Shake(count) => sink.on_shake(count),
            Self::SilentEmergency => sink.on_silent_emergency(),
            Self::PoliceNeeded => sink.on_police_needed(),
            Self::MedicalEmergency => sink.on_medical_emergency(),
            Self::PanicAlert => sink.on_panic_alert(),
        }
    }
}

// ---------------------------------------------------------------------------
// Alert kinds handed to the alerting side (SMS, history, ...)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    General,
    Silent,
    Police,
    Medical,
    Panic,
}

impl AlertKind {
    /// Stable identifier stored with alert history records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::General => "shake_alert",
            Self::Silent => "silent_alert",
            Self::Police => "police_alert",
            Self::Medical => "medical_alert",
            Self::Panic => "panic_alert",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::General => "General Emergency",
            Self::Silent => "Silent Emergency",
            Self::Police => "Police Alert",
            Self::Medical => "Medical Emergency",
            Self::Panic => "Panic Alert",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "shake_alert" => Some(Self::General),
            "silent_alert" => Some(Self::Silent),
            "police_alert" => Some(Self::Police),
            "medical_alert" => Some(Self::Medical),
            "panic_alert" => Some(Self::Panic),
            _ => None,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Distress sink: the alerting collaborator's side of the boundary
// ---------------------------------------------------------------------------

/// Receives classified gestures, one call per emission.
pub trait DistressSink {
    fn on_shake(&mut self, count: u32);
    fn on_silent_emergency(&mut self);
    fn on_police_needed(&mut self);
    fn on_medical_emergency(&mut self);
    fn on_panic_alert(&mut self);
}

/// Records every emission in order.
impl DistressSink for Vec<GestureEvent> {
    fn on_shake(&mut self, count: u32) {
        self.push(GestureEvent::Shake(count));
    }
    fn on_silent_emergency(&mut self) {
        self.push(GestureEvent::SilentEmergency);
    }
    fn on_police_needed(&mut self) {
        self.push(GestureEvent::PoliceNeeded);
    }
    fn on_medical_emergency(&mut self) {
        self.push(GestureEvent::MedicalEmergency);
    }
    fn on_panic_alert(&mut self) {
        self.push(GestureEvent::PanicAlert);
    }
}

/// Forwards emissions to another task. A closed receiver drops the event
/// with a warning.
impl DistressSink for Sender<GestureEvent> {
    fn on_shake(&mut self, count: u32) {
        forward(self, GestureEvent::Shake(count));
    }

    fn on_silent_emergency(&mut self) {
        forward(self, GestureEvent::SilentEmergency);
    }

    fn on_police_needed(&mut self) {
        forward(self, GestureEvent::PoliceNeeded);
    }

    fn on_medical_emergency(&mut self) {
        forward(self, GestureEvent::MedicalEmergency);
    }

    fn on_panic_alert(&mut self) {
        forward(self, GestureEvent::PanicAlert);
    }
}

fn forward(tx: &Sender<GestureEvent>, event: GestureEvent) {
    if tx.send(event).is_err() {
        log::warn!("Gesture channel closed, dropping {:?}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shake_raises_alert_only_at_required_count() {
        assert_eq!(GestureEvent::Shake(1).alert_kind(3), None);
        assert_eq!(GestureEvent::Shake(2).alert_kind(3), None);
        assert_eq!(GestureEvent::Shake(3).alert_kind(3), Some(AlertKind::General));
        assert_eq!(GestureEvent::PanicAlert.alert_kind(3), Some(AlertKind::Panic));
    }

    #[test]
    fn alert_codes_parse_back() {
        for kind in [
            AlertKind::General,
            AlertKind::Silent,
            AlertKind::Police,
            AlertKind::Medical,
            AlertKind::Panic,
        ] {
            assert_eq!(AlertKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(AlertKind::from_code("sms_alert"), None);
    }

    #[test]
    fn dispatch_reaches_matching_sink_method() {
        let mut sink: Vec<GestureEvent> = Vec::new();
        GestureEvent::Shake(2).dispatch(&mut sink);
        GestureEvent::MedicalEmergency.dispatch(&mut sink);
        assert_eq!(sink, vec![GestureEvent::Shake(2), GestureEvent::MedicalEmergency]);
    }

    #[test]
    fn sender_sink_forwards_and_survives_a_closed_channel() {
        let (tx, rx) = std::sync::mpsc::channel::<GestureEvent>();
        let mut sink = tx;
        GestureEvent::PoliceNeeded.dispatch(&mut sink);
        assert_eq!(rx.recv().unwrap(), GestureEvent::PoliceNeeded);

        drop(rx);
        GestureEvent::PanicAlert.dispatch(&mut sink);
        sink.on_shake(1);
    }

    #[test]
    fn button_labels() {
        assert_eq!(ButtonId::from_label("volume-up"), Some(ButtonId::VolumeUp));
        assert_eq!(ButtonId::from_label("vol-down"), Some(ButtonId::VolumeDown));
        assert_eq!(ButtonId::from_label("power"), None);
        assert_eq!(ButtonId::VolumeDown.other(), ButtonId::VolumeUp);
    }
}
