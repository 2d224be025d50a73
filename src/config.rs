// Sentinel - Gesture Engine Configuration
//
// Compile-time defaults for both classifiers, plus the runtime
// `SentinelConfig` that a host can load from a TOML file and the environment.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::buttons::ButtonConfig;
use crate::shake::{ShakeConfig, ShakeSensitivity};

// ---------------------------------------------------------------------------
// Shake detection
// ---------------------------------------------------------------------------
pub const GRAVITY_EARTH: f32 = 9.806_65;            // m/s²
pub const SHAKE_THRESHOLD: f32 = 15.0;              // m/s² above gravity
pub const SHAKE_WINDOW_MS: u64 = 3000;
pub const SHAKE_DEBOUNCE_MS: u64 = 500;
pub const SHAKE_REQUIRED_COUNT: u32 = 3;

// ---------------------------------------------------------------------------
// Volume button gestures
// ---------------------------------------------------------------------------
pub const VOLUME_DOWN_RAPID_COUNT: usize = 5;       // silent emergency
pub const VOLUME_UP_RAPID_COUNT: usize = 3;         // police needed
pub const RAPID_PRESS_WINDOW_MS: u64 = 3000;
pub const LONG_PRESS_MS: u64 = 5000;                // medical emergency
pub const COMBO_PRESS_MS: u64 = 3000;               // panic alert

// ---------------------------------------------------------------------------
// Raw input handling
// ---------------------------------------------------------------------------
pub const BUTTON_DEBOUNCE_MS: u64 = 50;
pub const BUTTON_POLL_INTERVAL_MS: u64 = 10;        // 100 Hz GPIO poll
pub const SENSOR_SAMPLE_INTERVAL_MS: u64 = 16;      // ~62.5 Hz
pub const MAX_PENDING_TIMERS: usize = 8;

// ---------------------------------------------------------------------------
// Task stack sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_MONITOR: usize = 8192;
pub const STACK_SENSOR: usize = 4096;
pub const STACK_BUTTONS: usize = 4096;
pub const STACK_ALERT: usize = 4096;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

pub const CONFIG_PATH_ENV: &str = "SENTINEL_CONFIG";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SentinelConfigFile {
    shake: Option<ShakeConfigFile>,
    buttons: Option<ButtonConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ShakeConfigFile {
    enabled: Option<bool>,
    sensitivity: Option<ShakeSensitivity>,
    threshold: Option<f32>,
    window_ms: Option<u64>,
    debounce_ms: Option<u64>,
    required_count: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ButtonConfigFile {
    enabled: Option<bool>,
    volume_down_rapid_count: Option<usize>,
    volume_up_rapid_count: Option<usize>,
    rapid_window_ms: Option<u64>,
    long_press_ms: Option<u64>,
    combo_press_ms: Option<u64>,
}

impl SentinelConfigFile {
    /// Overlay `SENTINEL_*` variables on the file layer. Sensitivity and
    /// threshold stay separate here so a threshold from either layer still
    /// wins over a sensitivity from either layer.
    fn apply_env(&mut self) -> Result<()> {
        let shake = self.shake.get_or_insert_with(ShakeConfigFile::default);
        if let Some(enabled) = env_bool("SENTINEL_SHAKE_ENABLED")? {
            shake.enabled = Some(enabled);
        }
        if let Some(level) = env_value("SENTINEL_SHAKE_SENSITIVITY") {
            shake.sensitivity = Some(level.parse()?);
        }
        if let Some(threshold) = env_value("SENTINEL_SHAKE_THRESHOLD") {
            shake.threshold = Some(
                threshold
                    .parse()
                    .map_err(|_| anyhow!("SENTINEL_SHAKE_THRESHOLD must be a number in m/s²"))?,
            );
        }

        let buttons = self.buttons.get_or_insert_with(ButtonConfigFile::default);
        if let Some(enabled) = env_bool("SENTINEL_BUTTONS_ENABLED")? {
            buttons.enabled = Some(enabled);
        }
        if let Some(ms) = env_value("SENTINEL_LONG_PRESS_MS") {
            buttons.long_press_ms = Some(ms.parse().map_err(|_| {
                anyhow!("SENTINEL_LONG_PRESS_MS must be an integer number of milliseconds")
            })?);
        }
        Ok(())
    }
}

/// Everything the gesture engine needs for one monitoring session.
#[derive(Debug, Clone, PartialEq)]
pub struct SentinelConfig {
    pub shake: ShakeConfig,
    pub buttons: ButtonConfig,
    pub shake_enabled: bool,
    pub buttons_enabled: bool,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            shake: ShakeConfig::default(),
            buttons: ButtonConfig::default(),
            shake_enabled: true,
            buttons_enabled: true,
        }
    }
}

impl SentinelConfig {
    /// Load from the file named by `SENTINEL_CONFIG` (if set), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let mut file = match std::env::var(CONFIG_PATH_ENV).ok() {
            Some(path) if !path.trim().is_empty() => read_file(Path::new(&path))?,
            _ => SentinelConfigFile::default(),
        };
        file.apply_env()?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a TOML config file. Environment overrides are not applied.
    pub fn from_path(path: &Path) -> Result<Self> {
        let cfg = Self::from_file(read_file(path)?);
        cfg.validate()
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: SentinelConfigFile = toml::from_str(raw)?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentinelConfigFile) -> Self {
        let shake_file = file.shake.unwrap_or_default();
        let button_file = file.buttons.unwrap_or_default();

        // An explicit threshold wins over a sensitivity level.
        let threshold = shake_file.threshold.unwrap_or_else(|| {
            shake_file
                .sensitivity
                .unwrap_or_default()
                .threshold()
        });

        let shake = ShakeConfig {
            threshold,
            window_ms: shake_file.window_ms.unwrap_or(SHAKE_WINDOW_MS),
            debounce_ms: shake_file.debounce_ms.unwrap_or(SHAKE_DEBOUNCE_MS),
            required_count: shake_file.required_count.unwrap_or(SHAKE_REQUIRED_COUNT),
        };
        let buttons = ButtonConfig {
            volume_down_rapid_count: button_file
                .volume_down_rapid_count
                .unwrap_or(VOLUME_DOWN_RAPID_COUNT),
            volume_up_rapid_count: button_file
                .volume_up_rapid_count
                .unwrap_or(VOLUME_UP_RAPID_COUNT),
            rapid_window_ms: button_file.rapid_window_ms.unwrap_or(RAPID_PRESS_WINDOW_MS),
            long_press_ms: button_file.long_press_ms.unwrap_or(LONG_PRESS_MS),
            combo_press_ms: button_file.combo_press_ms.unwrap_or(COMBO_PRESS_MS),
        };

        Self {
            shake,
            buttons,
            shake_enabled: shake_file.enabled.unwrap_or(true),
            buttons_enabled: button_file.enabled.unwrap_or(true),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let shake = &self.shake;
        if !shake.threshold.is_finite() || shake.threshold < 0.0 {
            return Err(anyhow!("shake threshold must be a finite, non-negative number"));
        }
        if shake.window_ms == 0 {
            return Err(anyhow!("shake window_ms must be greater than zero"));
        }
        if shake.required_count == 0 {
            return Err(anyhow!("shake required_count must be at least 1"));
        }

        let buttons = &self.buttons;
        if buttons.volume_down_rapid_count == 0 || buttons.volume_up_rapid_count == 0 {
            return Err(anyhow!("rapid press counts must be at least 1"));
        }
        for (name, value) in [
            ("rapid_window_ms", buttons.rapid_window_ms),
            ("long_press_ms", buttons.long_press_ms),
            ("combo_press_ms", buttons.combo_press_ms),
        ] {
            if value == 0 {
                return Err(anyhow!("button {} must be greater than zero", name));
            }
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<SentinelConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_bool(key: &str) -> Result<Option<bool>> {
    match env_value(key) {
        None => Ok(None),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(anyhow!("{} must be a boolean (true/false)", key)),
        },
    }
}
