use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use sentinel::config::{COMBO_PRESS_MS, SHAKE_THRESHOLD};
use sentinel::SentinelConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SENTINEL_CONFIG",
        "SENTINEL_SHAKE_ENABLED",
        "SENTINEL_BUTTONS_ENABLED",
        "SENTINEL_SHAKE_SENSITIVITY",
        "SENTINEL_SHAKE_THRESHOLD",
        "SENTINEL_LONG_PRESS_MS",
    ] {
        std::env::remove_var(key);
    }
}

fn config_file(toml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(toml.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SentinelConfig::load().expect("load config");
    assert_eq!(cfg, SentinelConfig::default());
}

#[test]
fn loads_file_then_applies_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = config_file(
        r#"
            [shake]
            sensitivity = "low"
            window_ms = 4000
            required_count = 4

            [buttons]
            volume_down_rapid_count = 4
            long_press_ms = 3000
        "#,
    );
    std::env::set_var("SENTINEL_CONFIG", file.path());
    std::env::set_var("SENTINEL_BUTTONS_ENABLED", "false");
    std::env::set_var("SENTINEL_LONG_PRESS_MS", "4500");

    let cfg = SentinelConfig::load().expect("load config");
    clear_env();

    assert_eq!(cfg.shake.threshold, 20.0);
    assert_eq!(cfg.shake.window_ms, 4000);
    assert_eq!(cfg.shake.required_count, 4);
    assert_eq!(cfg.buttons.volume_down_rapid_count, 4);
    assert_eq!(cfg.buttons.long_press_ms, 4500);
    assert_eq!(cfg.buttons.combo_press_ms, COMBO_PRESS_MS);
    assert!(cfg.shake_enabled);
    assert!(!cfg.buttons_enabled);
}

#[test]
fn explicit_threshold_env_beats_sensitivity_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SENTINEL_SHAKE_SENSITIVITY", "very-high");
    let cfg = SentinelConfig::load().expect("load config");
    assert_eq!(cfg.shake.threshold, 9.0);

    std::env::set_var("SENTINEL_SHAKE_THRESHOLD", "18.5");
    let cfg = SentinelConfig::load().expect("load config");
    clear_env();
    assert_eq!(cfg.shake.threshold, 18.5);
    assert_ne!(cfg.shake.threshold, SHAKE_THRESHOLD);
}

#[test]
fn file_threshold_survives_env_sensitivity() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = config_file("[shake]\nthreshold = 17.5\n");
    std::env::set_var("SENTINEL_CONFIG", file.path());
    std::env::set_var("SENTINEL_SHAKE_SENSITIVITY", "high");

    let cfg = SentinelConfig::load().expect("load config");
    clear_env();
    assert_eq!(cfg.shake.threshold, 17.5);
}

#[test]
fn env_sensitivity_replaces_file_sensitivity() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = config_file("[shake]\nsensitivity = \"very-low\"\n");
    std::env::set_var("SENTINEL_CONFIG", file.path());
    std::env::set_var("SENTINEL_SHAKE_SENSITIVITY", "high");

    let cfg = SentinelConfig::load().expect("load config");
    clear_env();
    assert_eq!(cfg.shake.threshold, 12.0);
}

#[test]
fn rejects_bad_env_and_bad_files() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SENTINEL_SHAKE_ENABLED", "maybe");
    assert!(SentinelConfig::load().is_err());
    clear_env();

    std::env::set_var("SENTINEL_SHAKE_SENSITIVITY", "extreme");
    assert!(SentinelConfig::load().is_err());
    clear_env();

    std::env::set_var("SENTINEL_LONG_PRESS_MS", "0");
    assert!(SentinelConfig::load().is_err());
    clear_env();

    let file = config_file("[buttons]\nrapid_window_ms = \"soon\"\n");
    std::env::set_var("SENTINEL_CONFIG", file.path());
    let err = SentinelConfig::load().unwrap_err();
    clear_env();
    assert!(err.to_string().contains("invalid config file"));

    std::env::set_var("SENTINEL_CONFIG", "/nonexistent/sentinel.toml");
    assert!(SentinelConfig::load().is_err());
    clear_env();
}
