//! On-board peripheral drivers

pub mod battery;
pub mod pcf85063;
pub mod shtc3;

use embedded_hal_bus::i2c::RefCellDevice;
use esp_hal::i2c::master::I2c;
use esp_hal::Blocking;

/// The RTC and the environment sensor share the one I2C bus
pub type BusDevice = RefCellDevice<'static, I2c<'static, Blocking>>;
