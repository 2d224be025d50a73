// Sentinel - Motion Shake Classifier
//
// Counts distinct shakes of the device inside a sliding window.  A sample
// counts when its acceleration magnitude, minus gravity, exceeds the
// threshold; readings closer together than the debounce interval are bounces
// of the same physical shake and are dropped.
//
// Timestamps are expected to be non-decreasing.  A sample that goes back in
// time reads as "no time elapsed" and is debounced.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::config::*;
use crate::events::{GestureEvent, SensorSample};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeConfig {
    /// Acceleration above gravity a sample must exceed (m/s²).
    pub threshold: f32,
    pub window_ms: u64,
    pub debounce_ms: u64,
    /// Shakes that complete one gesture; the count restarts after this.
    pub required_count: u32,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            threshold: SHAKE_THRESHOLD,
            window_ms: SHAKE_WINDOW_MS,
            debounce_ms: SHAKE_DEBOUNCE_MS,
            required_count: SHAKE_REQUIRED_COUNT,
        }
    }
}

// ---------------------------------------------------------------------------
// Sensitivity presets (user-facing setting, 0 = Very Low .. 4 = Very High)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShakeSensitivity {
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Error)]
#[error("unknown shake sensitivity {0:?} (expected very-low, low, medium, high, very-high or 0-4)")]
pub struct UnknownSensitivity(String);

impl ShakeSensitivity {
    /// More sensitive means a gentler shake is enough.
    pub fn threshold(&self) -> f32 {
        match self {
            Self::VeryLow => 25.0,
            Self::Low => 20.0,
            Self::Medium => SHAKE_THRESHOLD,
            Self::High => 12.0,
            Self::VeryHigh => 9.0,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::VeryLow),
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::VeryHigh),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

impl FromStr for ShakeSensitivity {
    type Err = UnknownSensitivity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return Self::from_index(index).ok_or_else(|| UnknownSensitivity(s.to_string()));
        }
        match s.to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "very-low" => Ok(Self::VeryLow),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "very-high" => Ok(Self::VeryHigh),
            _ => Err(UnknownSensitivity(s.to_string())),
        }
    }
}

impl fmt::Display for ShakeSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Window state. `None` means no shake has been seen since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShakeState {
    pub shake_count: u32,
    pub first_shake_ms: Option<u64>,
    pub last_shake_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ShakeClassifier {
    config: ShakeConfig,
    state: ShakeState,
}

impl ShakeClassifier {
    pub fn new(config: ShakeConfig) -> Self {
        Self {
            config,
            state: ShakeState::default(),
        }
    }

    pub fn config(&self) -> &ShakeConfig {
        &self.config
    }

    pub fn state(&self) -> ShakeState {
        self.state
    }

    /// Feed one accelerometer tick. Returns `Shake(count)` for every distinct
    /// qualifying shake, including intermediate counts.
    pub fn on_sample(&mut self, sample: &SensorSample) -> Option<GestureEvent> {
        // Sensor noise (NaN/inf) is treated as "below threshold".
        if !sample.is_finite() {
            return None;
        }
        // Finite but huge axes overflow to +inf, which still counts.
        let magnitude =
            (sample.x * sample.x + sample.y * sample.y + sample.z * sample.z).sqrt() - GRAVITY_EARTH;
        if magnitude <= self.config.threshold {
            return None;
        }

        let now = sample.timestamp_ms;
        let state = &mut self.state;

        // A stale window restarts around the newest qualifying sample.
        let window_expired = state
            .first_shake_ms
            .map_or(true, |first| now.saturating_sub(first) > self.config.window_ms);
        if window_expired {
            state.shake_count = 0;
            state.first_shake_ms = Some(now);
        }

        if let Some(last) = state.last_shake_ms {
            if now.saturating_sub(last) <= self.config.debounce_ms {
                return None;
            }
        }

        state.last_shake_ms = Some(now);
        if state.shake_count == 0 {
            state.first_shake_ms = Some(now);
        }
        state.shake_count += 1;
        let count = state.shake_count;
        log::debug!("shake {} at {} ms (magnitude {:.1})", count, now, magnitude);

        if state.shake_count >= self.config.required_count {
            state.shake_count = 0;
        }
        Some(GestureEvent::Shake(count))
    }

    pub fn reset(&mut self) {
        self.state = ShakeState::default();
    }
}
