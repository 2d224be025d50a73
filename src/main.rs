// Sentinel - Entry Point
//
// On the watch (ESP-IDF):
//   1. Bring up the I2C bus and check the MPU6050.
//   2. Start the gesture monitor.
//   3. Spawn sensor, button and alert tasks around it.
//
// On a host: `sentinel replay <trace>` runs a recorded input trace through
// the gesture engine and prints what it detects.

#[cfg(target_os = "espidf")]
mod drivers;
#[cfg(target_os = "espidf")]
mod tasks;

// ---------------------------------------------------------------------------
// Host: replay tool
// ---------------------------------------------------------------------------
#[cfg(not(target_os = "espidf"))]
mod host {
    use std::path::PathBuf;

    use anyhow::Result;
    use clap::{Parser, Subcommand};

    use sentinel::trace::{load_trace, replay};
    use sentinel::{GestureEngine, GestureEvent, SentinelConfig};

    #[derive(Debug, Parser)]
    #[command(name = "sentinel", version, about = "Distress gesture engine tools")]
    struct Cli {
        /// TOML config file (defaults to $SENTINEL_CONFIG, then built-in values)
        #[arg(long, global = true)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Replay a recorded input trace and print the detected gestures
        Replay {
            trace: PathBuf,
            /// Let the clock run this long past the last input
            #[arg(long, default_value_t = 0)]
            tail_ms: u64,
        },
        /// Print the effective configuration
        Config,
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let cli = Cli::parse();

        let config = match &cli.config {
            Some(path) => SentinelConfig::from_path(path)?,
            None => SentinelConfig::load()?,
        };

        match cli.command {
            Command::Config => println!("{:#?}", config),
            Command::Replay { trace, tail_ms } => {
                let inputs = load_trace(&trace)?;
                log::info!("replaying {} inputs from {}", inputs.len(), trace.display());

                let mut engine = GestureEngine::new(&config, Vec::<GestureEvent>::new());
                replay(&mut engine, &inputs, tail_ms);
                engine.stop();

                let events = engine.into_sink();
                for event in &events {
                    match event.alert_kind(config.shake.required_count) {
                        Some(kind) => println!("{:?}\t{}\t{}", event, kind.code(), kind),
                        None => println!("{:?}", event),
                    }
                }
                log::info!("{} gestures detected", events.len());
            }
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    host::run()
}

// ---------------------------------------------------------------------------
// Watch firmware
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::gpio::{IOPin, OutputPin, PinDriver, Pull};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use sentinel::config::*;
    use sentinel::{ButtonId, Monitor, SentinelConfig};

    use crate::drivers::haptic::HapticDriver;
    use crate::drivers::imu::Mpu6050;

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Sentinel firmware starting…");

    let peripherals = Peripherals::take()?;

    // ---- I2C bus (MPU6050) ------------------------------------------------
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &i2c_config,
    )?;
    // The bus lives for the whole programme (firmware never exits).
    let i2c_bus: &'static Mutex<I2cDriver<'static>> = Box::leak(Box::new(Mutex::new(i2c)));

    let imu = Mpu6050::new(i2c_bus);
    if !imu.is_connected() {
        log::error!("MPU6050 not found, shake detection will see no samples");
    }

    // ---- Buttons (pull-up, active LOW) and haptic motor -------------------
    let mut volume_down = PinDriver::input(peripherals.pins.gpio3.downgrade())?;
    volume_down.set_pull(Pull::Up)?;
    let mut volume_up = PinDriver::input(peripherals.pins.gpio5.downgrade())?;
    volume_up.set_pull(Pull::Up)?;
    let haptic = HapticDriver::new(PinDriver::output(peripherals.pins.gpio4.downgrade_output())?);

    // ---- Gesture monitor --------------------------------------------------
    let config = SentinelConfig::default();
    let required_shakes = config.shake.required_count;
    let (alert_tx, alert_rx) = mpsc::channel();
    let monitor = Monitor::spawn(config, alert_tx)?;

    // ---- Spawn tasks ------------------------------------------------------
    let sensor_handle = monitor.handle();
    thread::Builder::new()
        .name("sensor".into())
        .stack_size(STACK_SENSOR)
        .spawn(move || tasks::sensor::sensor_task(imu, sensor_handle))?;

    let button_handle = monitor.handle();
    thread::Builder::new()
        .name("buttons".into())
        .stack_size(STACK_BUTTONS)
        .spawn(move || {
            tasks::buttons::button_task(
                [(ButtonId::VolumeDown, volume_down), (ButtonId::VolumeUp, volume_up)],
                button_handle,
            )
        })?;

    thread::Builder::new()
        .name("alert".into())
        .stack_size(STACK_ALERT)
        .spawn(move || tasks::alert::alert_task(alert_rx, haptic, required_shakes))?;

    log::info!("Boot complete, monitoring for distress gestures");

    // All work happens in the spawned tasks; keep the monitor alive forever.
    let _monitor = monitor;
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}
