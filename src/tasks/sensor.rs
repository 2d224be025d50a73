// Sentinel - Sensor Task
//
// Reads the accelerometer at ~62.5 Hz and submits each sample to the gesture
// monitor, stamped with the monitor's clock.

use std::thread;
use std::time::{Duration, Instant};

use sentinel::config::SENSOR_SAMPLE_INTERVAL_MS;
use sentinel::MonitorHandle;

use crate::drivers::imu::Mpu6050;

pub fn sensor_task(imu: Mpu6050, monitor: MonitorHandle) {
    log::info!("Sensor task started");

    if let Err(e) = imu.init() {
        log::error!("MPU6050 init failed in sensor task: {}", e);
        return;
    }

    let interval = Duration::from_millis(SENSOR_SAMPLE_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        match imu.read_accel() {
            Ok([x, y, z]) => {
                if monitor.sample(x, y, z).is_err() {
                    log::warn!("Monitor stopped, exiting sensor task");
                    return;
                }
            }
            Err(e) => {
                log::warn!("IMU read error: {}", e);
            }
        }

        // Sleep for the remainder of the sampling interval.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
