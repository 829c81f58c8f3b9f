//! Sensirion SHT3x temperature/humidity sensor driver (I²C).
//!
//! Single-shot, high-repeatability measurements with clock stretching
//! disabled:
//!
//! ```text
//!  write [0x24 0x00] ── wait 15 ms ── read [T_hi T_lo CRC RH_hi RH_lo CRC]
//! ```
//!
//! Each 16-bit word carries a CRC-8 (poly 0x31, init 0xFF).  Conversion per
//! datasheet: `T = -45 + 175·raw/65535 °C`, `RH = 100·raw/65535 %`.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::SensorPort;
use crate::error::SensorError;

/// Default 7-bit address (ADDR pin low).
pub const DEFAULT_ADDRESS: u8 = 0x44;

const CMD_SINGLE_SHOT_HIGH: [u8; 2] = [0x24, 0x00];
const MEASURE_DELAY_MS: u32 = 15;

/// One combined measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub struct Sht31<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> Sht31<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Trigger a measurement and read both channels.
    pub fn measure(&mut self) -> Result<Measurement, SensorError> {
        self.i2c
            .write(self.address, &CMD_SINGLE_SHOT_HIGH)
            .map_err(|_| SensorError::BusFailed)?;
        self.delay.delay_ms(MEASURE_DELAY_MS);

        let mut buf = [0u8; 6];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(|_| SensorError::BusFailed)?;

        let raw_t = checked_word(&buf[0..3])?;
        let raw_rh = checked_word(&buf[3..6])?;

        Ok(Measurement {
            temperature_c: -45.0 + 175.0 * f32::from(raw_t) / 65535.0,
            humidity_pct: 100.0 * f32::from(raw_rh) / 65535.0,
        })
    }

    /// Release the bus.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}

impl<I: I2c, D: DelayNs> SensorPort for Sht31<I, D> {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.measure().map(|m| m.temperature_c)
    }

    fn read_humidity(&mut self) -> Result<f32, SensorError> {
        self.measure().map(|m| m.humidity_pct)
    }
}

fn checked_word(chunk: &[u8]) -> Result<u16, SensorError> {
    let crc = crc8(&chunk[0..2]);
    if crc != chunk[2] {
        warn!("SHT31: CRC mismatch (got 0x{:02X}, want 0x{:02X})", chunk[2], crc);
        return Err(SensorError::CrcMismatch);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

/// CRC-8, polynomial 0x31, init 0xFF, no reflection.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}
