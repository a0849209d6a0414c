//! Hardware interface to the panel controller
//!
//! The controller takes 4-wire SPI: MOSI, SCK, a data/command select
//! pin and an active-low reset pin. [`SpiInterface`] implements
//! [`DisplayInterface`] over embedded-hal 1.0 traits; the trait exists
//! so host tests can capture the byte stream instead.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

/// Byte-level access to the panel controller
pub trait DisplayInterface {
    type Error: Debug;

    /// Send one command byte with DC low
    fn command(&mut self, command: u8) -> Result<(), Self::Error>;

    /// Send parameter or framebuffer bytes with DC high
    fn data(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Drive the hardware reset pulse: high 50ms, low 20ms, high 50ms
    fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Self::Error>;
}

/// Reset pulse timing
const RESET_HIGH_MS: u32 = 50;
const RESET_LOW_MS: u32 = 20;

/// [`DisplayInterface`] over an embedded-hal SPI device and two pins
pub struct SpiInterface<SPI, DC, RST> {
    spi: SPI,
    dc: DC,
    rst: RST,
}

/// SPI or GPIO failure
#[derive(Debug)]
pub enum SpiInterfaceError<SpiErr, PinErr> {
    Spi(SpiErr),
    Pin(PinErr),
}

impl<SPI, DC, RST> SpiInterface<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
{
    pub fn new(spi: SPI, dc: DC, rst: RST) -> Self {
        Self { spi, dc, rst }
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, DC, RST) {
        (self.spi, self.dc, self.rst)
    }
}

impl<SPI, DC, RST> DisplayInterface for SpiInterface<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin<Error = DC::Error>,
{
    type Error = SpiInterfaceError<SPI::Error, DC::Error>;

    fn command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.dc.set_low().map_err(SpiInterfaceError::Pin)?;
        self.spi.write(&[command]).map_err(SpiInterfaceError::Spi)
    }

    fn data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(SpiInterfaceError::Pin)?;
        self.spi.write(data).map_err(SpiInterfaceError::Spi)
    }

    fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Self::Error> {
        self.rst.set_high().map_err(SpiInterfaceError::Pin)?;
        delay.delay_ms(RESET_HIGH_MS);
        self.rst.set_low().map_err(SpiInterfaceError::Pin)?;
        delay.delay_ms(RESET_LOW_MS);
        self.rst.set_high().map_err(SpiInterfaceError::Pin)?;
        delay.delay_ms(RESET_HIGH_MS);
        Ok(())
    }
}
