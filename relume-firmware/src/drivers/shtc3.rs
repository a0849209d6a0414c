//! SHTC3 temperature/humidity sensor
//!
//! Woken per read, measured in normal mode with clock stretching off,
//! then put back to sleep. Both words carry a CRC-8 (poly 0x31, init
//! 0xFF); a bad checksum drops the sample.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use relume_core::traits::{EnvReading, EnvSensor};

const ADDR: u8 = 0x70;

const CMD_WAKE: [u8; 2] = [0x35, 0x17];
const CMD_SLEEP: [u8; 2] = [0xB0, 0x98];
/// Normal mode, temperature first, no clock stretching
const CMD_MEASURE: [u8; 2] = [0x78, 0x66];

/// Wake-up settling time
const WAKE_DELAY_US: u32 = 250;
/// Normal-mode measurement duration
const MEASURE_DELAY_MS: u32 = 13;

fn crc8(bytes: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in bytes {
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

pub struct Shtc3<I, D> {
    i2c: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> Shtc3<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self { i2c, delay }
    }

    fn measure(&mut self) -> Result<Option<EnvReading>, I::Error> {
        self.i2c.write(ADDR, &CMD_WAKE)?;
        self.delay.delay_us(WAKE_DELAY_US);
        self.i2c.write(ADDR, &CMD_MEASURE)?;
        self.delay.delay_ms(MEASURE_DELAY_MS);

        let mut raw = [0u8; 6];
        self.i2c.read(ADDR, &mut raw)?;
        self.i2c.write(ADDR, &CMD_SLEEP)?;

        if crc8(&raw[0..2]) != raw[2] || crc8(&raw[3..5]) != raw[5] {
            warn!("shtc3: checksum mismatch");
            return Ok(None);
        }

        let t = u16::from_be_bytes([raw[0], raw[1]]) as i32;
        let h = u16::from_be_bytes([raw[3], raw[4]]) as u32;
        Ok(Some(EnvReading {
            temp_c_x10: (-450 + ((1750 * t) >> 16)) as i16,
            humidity_x10: ((1000 * h) >> 16) as u16,
        }))
    }
}

impl<I: I2c, D: DelayNs> EnvSensor for Shtc3<I, D> {
    fn read(&mut self) -> Option<EnvReading> {
        match self.measure() {
            Ok(reading) => reading,
            Err(_) => {
                warn!("shtc3: bus error");
                None
            }
        }
    }
}
