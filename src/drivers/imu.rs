// Sentinel - MPU6050 Accelerometer Driver
//
// Register-level driver over the shared I2C bus.  Only the accelerometer is
// used: the shake classifier wants m/s² on three axes, nothing else.

use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use esp_idf_hal::i2c::I2cDriver;

use sentinel::config::GRAVITY_EARTH;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

const I2C_ADDR_MPU6050: u8 = 0x68;
const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// MPU6050 register addresses
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_CONFIG: u8 = 0x1A;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B; // Start of the 6-byte accel burst
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;

// ±16 g full scale: a violent shake easily exceeds ±8 g.
const ACCEL_FS_16G: u8 = 0x18;
const ACCEL_LSB_PER_G: f32 = 2048.0;

pub struct Mpu6050 {
    bus: SharedBus,
}

impl Mpu6050 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, I2cDriver<'static>>> {
        self.bus.lock().map_err(|_| anyhow!("I2C bus mutex poisoned"))
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let Ok(mut bus) = self.lock() else {
            return false;
        };
        let mut buf = [0u8; 1];
        match bus.write_read(I2C_ADDR_MPU6050, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }

    /// Wake the sensor and configure the accelerometer (±16 g, DLPF 44 Hz).
    pub fn init(&self) -> anyhow::Result<()> {
        let mut bus = self.lock()?;

        // Wake up (clear SLEEP bit)
        bus.write(I2C_ADDR_MPU6050, &[REG_PWR_MGMT_1, 0x00], I2C_TIMEOUT_TICKS)?;

        // DLPF bandwidth 44 Hz
        bus.write(I2C_ADDR_MPU6050, &[REG_CONFIG, 0x03], I2C_TIMEOUT_TICKS)?;

        bus.write(I2C_ADDR_MPU6050, &[REG_ACCEL_CONFIG, ACCEL_FS_16G], I2C_TIMEOUT_TICKS)?;

        log::info!("MPU6050 initialised (±16g, DLPF 44Hz)");
        Ok(())
    }

    /// Burst-read the three accel axes, in m/s².
    pub fn read_accel(&self) -> anyhow::Result<[f32; 3]> {
        let mut bus = self.lock()?;
        let mut raw = [0u8; 6];
        bus.write_read(I2C_ADDR_MPU6050, &[REG_ACCEL_XOUT_H], &mut raw, I2C_TIMEOUT_TICKS)?;

        let axis = |hi: u8, lo: u8| i16::from_be_bytes([hi, lo]) as f32 / ACCEL_LSB_PER_G * GRAVITY_EARTH;
        Ok([axis(raw[0], raw[1]), axis(raw[2], raw[3]), axis(raw[4], raw[5])])
    }
}
