//! PCF85063 battery-backed RTC
//!
//! Calendar registers are BCD starting at 0x04. The oscillator-stop
//! bit in the seconds register marks the stored time as invalid, so a
//! read after battery loss yields `None` instead of a bogus epoch.

use embedded_hal::i2c::I2c;
use log::warn;

use relume_core::clock::{epoch_from_civil, CivilTime};
use relume_core::traits::HardwareRtc;

const ADDR: u8 = 0x51;
const REG_SECONDS: u8 = 0x04;
/// Oscillator-stop flag in the seconds register
const OS_BIT: u8 = 0x80;

fn from_bcd(b: u8) -> u8 {
    (b >> 4) * 10 + (b & 0x0F)
}

fn to_bcd(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

pub struct Pcf85063<I> {
    i2c: I,
}

impl<I: I2c> Pcf85063<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    fn read_registers(&mut self) -> Result<Option<i64>, I::Error> {
        let mut regs = [0u8; 7];
        self.i2c.write_read(ADDR, &[REG_SECONDS], &mut regs)?;

        if regs[0] & OS_BIT != 0 {
            return Ok(None);
        }

        let second = from_bcd(regs[0] & 0x7F);
        let minute = from_bcd(regs[1] & 0x7F);
        let hour = from_bcd(regs[2] & 0x3F);
        let day = from_bcd(regs[3] & 0x3F);
        // regs[4] is the weekday, derivable from the date
        let month = from_bcd(regs[5] & 0x1F);
        let year = 2000 + from_bcd(regs[6]) as u16;

        Ok(Some(epoch_from_civil(year, month, day, hour, minute, second)))
    }

    fn write_registers(&mut self, epoch: i64) -> Result<(), I::Error> {
        let civil = CivilTime::from_epoch(epoch, 0);
        let payload = [
            REG_SECONDS,
            to_bcd(civil.second), // also clears the OS flag
            to_bcd(civil.minute),
            to_bcd(civil.hour),
            to_bcd(civil.day),
            civil.weekday & 0x07,
            to_bcd(civil.month),
            to_bcd(civil.year.saturating_sub(2000).min(99) as u8),
        ];
        self.i2c.write(ADDR, &payload)
    }
}

impl<I: I2c> HardwareRtc for Pcf85063<I> {
    fn read_epoch(&mut self) -> Option<i64> {
        match self.read_registers() {
            Ok(epoch) => epoch,
            Err(_) => {
                warn!("pcf85063: bus error on read");
                None
            }
        }
    }

    fn write_epoch(&mut self, epoch: i64) {
        if self.write_registers(epoch).is_err() {
            warn!("pcf85063: bus error on write");
        }
    }
}
