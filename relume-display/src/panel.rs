//! Panel driver: framebuffer, init sequence and full-frame flush
//!
//! The driver owns a packed 1-bit framebuffer (15 kB for 400x300) and
//! the [`PixelMapper`] that scatters logical pixels into it. Drawing
//! only touches the buffer; [`flush`](PanelDriver::flush) sends the
//! whole frame, which is how this controller is meant to be driven --
//! partial window writes are not worth it at 15 kB per frame.

use alloc::boxed::Box;
use alloc::vec;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;

use crate::color::Mono;
use crate::command::{
    InitOp, COLUMN_ADDRESS, COLUMN_WINDOW, CONTRAST_MAX, INIT_SEQUENCE, MEMORY_WRITE, ROW_ADDRESS,
    ROW_WINDOW, VCOM_CONTROL, VCOM_LOW,
};
use crate::error::Error;
use crate::interface::DisplayInterface;
use crate::mapper::{Orientation, PixelMapper};

/// Byte value for an all-white framebuffer
const WHITE_FILL: u8 = 0xFF;

/// Driver for the 1-bit reflective panel
pub struct PanelDriver<I> {
    iface: I,
    mapper: PixelMapper,
    buffer: Box<[u8]>,
}

impl<I: DisplayInterface> PanelDriver<I> {
    /// Allocate the framebuffer and mapping tables
    ///
    /// Orientation follows the logical width, matching how the module
    /// is wired: 400 wide means landscape.
    pub fn new(iface: I, width: u16, height: u16) -> Result<Self, Error<I>> {
        let orientation = Orientation::for_width(width);
        let mapper = PixelMapper::new(width, height, orientation)
            .ok_or(Error::InvalidDimensions { width, height })?;
        let buffer = vec![WHITE_FILL; mapper.buffer_len()].into_boxed_slice();
        log::info!("rlcd panel {width}x{height}, {} byte frame", buffer.len());
        Ok(Self {
            iface,
            mapper,
            buffer,
        })
    }

    /// Hardware reset followed by the vendor init sequence
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I>> {
        self.iface.reset(delay).map_err(Error::Interface)?;
        for InitOp {
            command,
            data,
            delay_after_ms,
        } in INIT_SEQUENCE
        {
            self.iface.command(*command).map_err(Error::Interface)?;
            self.iface.data(data).map_err(Error::Interface)?;
            if *delay_after_ms > 0 {
                delay.delay_ms(*delay_after_ms);
            }
        }
        Ok(())
    }

    /// Set one pixel in the framebuffer; out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: u16, y: u16, color: Mono) {
        if let Some((index, mask)) = self.mapper.locate(x, y) {
            if color.is_white() {
                self.buffer[index] |= mask;
            } else {
                self.buffer[index] &= !mask;
            }
        }
    }

    /// Fill the framebuffer with one color
    pub fn clear_to(&mut self, color: Mono) {
        let fill = if color.is_white() { WHITE_FILL } else { 0x00 };
        self.buffer.fill(fill);
    }

    /// Send the whole frame to the panel
    pub fn flush(&mut self) -> Result<(), Error<I>> {
        self.iface.command(COLUMN_ADDRESS).map_err(Error::Interface)?;
        self.iface.data(&COLUMN_WINDOW).map_err(Error::Interface)?;
        self.iface.command(ROW_ADDRESS).map_err(Error::Interface)?;
        self.iface.data(&ROW_WINDOW).map_err(Error::Interface)?;
        self.iface.command(MEMORY_WRITE).map_err(Error::Interface)?;
        self.iface.data(&self.buffer).map_err(Error::Interface)
    }

    /// Adjust contrast via the VCOM level, clamped to the register range
    ///
    /// The factory level is [`crate::command::CONTRAST_DEFAULT`]; values
    /// far outside [`crate::command::CONTRAST_SWEET_SPOT`] wash the image
    /// out in both directions.
    pub fn set_contrast(&mut self, level: u8) -> Result<(), Error<I>> {
        let level = level.min(CONTRAST_MAX);
        self.iface.command(VCOM_CONTROL).map_err(Error::Interface)?;
        self.iface.data(&[level, VCOM_LOW]).map_err(Error::Interface)?;
        log::info!("panel contrast set to {level:#04x}");
        Ok(())
    }

    pub fn width(&self) -> u16 {
        self.mapper.width()
    }

    pub fn height(&self) -> u16 {
        self.mapper.height()
    }

    pub(crate) fn mapper(&self) -> &PixelMapper {
        &self.mapper
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Raw framebuffer, for tests and diagnostics
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    #[cfg(test)]
    pub(crate) fn iface(&self) -> &I {
        &self.iface
    }
}

impl<I> OriginDimensions for PanelDriver<I> {
    fn size(&self) -> Size {
        Size::new(self.mapper.width() as u32, self.mapper.height() as u32)
    }
}

impl<I: DisplayInterface> DrawTarget for PanelDriver<I> {
    type Color = Mono;
    type Error = core::convert::Infallible;

    fn draw_iter<P>(&mut self, pixels: P) -> Result<(), Self::Error>
    where
        P: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u16, point.y as u16, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        if *area == Rectangle::new(Point::zero(), self.size()) {
            self.clear_to(color);
            return Ok(());
        }
        for point in area.points() {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u16, point.y as u16, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Captures the command/data stream for assertions
    #[derive(Default)]
    pub(crate) struct MockIface {
        pub ops: Vec<MockOp>,
        pub resets: usize,
    }

    #[derive(Debug, PartialEq, Eq)]
    pub(crate) enum MockOp {
        Command(u8),
        Data(Vec<u8>),
    }

    impl DisplayInterface for MockIface {
        type Error = core::convert::Infallible;

        fn command(&mut self, command: u8) -> Result<(), Self::Error> {
            self.ops.push(MockOp::Command(command));
            Ok(())
        }

        fn data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
            if !data.is_empty() {
                self.ops.push(MockOp::Data(data.to_vec()));
            }
            Ok(())
        }

        fn reset(&mut self, _delay: &mut impl DelayNs) -> Result<(), Self::Error> {
            self.resets += 1;
            Ok(())
        }
    }

    pub(crate) struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    pub(crate) fn panel() -> PanelDriver<MockIface> {
        PanelDriver::new(MockIface::default(), 400, 300).unwrap()
    }

    #[test]
    fn starts_white() {
        let p = panel();
        assert_eq!(p.buffer().len(), 15_000);
        assert!(p.buffer().iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn init_resets_then_sends_sequence() {
        let mut p = panel();
        p.init(&mut NoDelay).unwrap();
        assert_eq!(p.iface.resets, 1);
        // First command of the vendor sequence, last is display-on
        assert_eq!(p.iface.ops[0], MockOp::Command(0xD6));
        assert_eq!(*p.iface.ops.last().unwrap(), MockOp::Command(0x29));
        // Sleep-out appears exactly once
        let sleep_outs = p
            .iface
            .ops
            .iter()
            .filter(|op| **op == MockOp::Command(0x11))
            .count();
        assert_eq!(sleep_outs, 1);
    }

    #[test]
    fn flush_sets_windows_then_streams_frame() {
        let mut p = panel();
        p.flush().unwrap();
        let ops = &p.iface.ops;
        assert_eq!(ops[0], MockOp::Command(0x2A));
        assert_eq!(ops[1], MockOp::Data(alloc::vec![0x12, 0x2A]));
        assert_eq!(ops[2], MockOp::Command(0x2B));
        assert_eq!(ops[3], MockOp::Data(alloc::vec![0x00, 0xC7]));
        assert_eq!(ops[4], MockOp::Command(0x2C));
        match &ops[5] {
            MockOp::Data(frame) => assert_eq!(frame.len(), 15_000),
            other => panic!("expected frame data, got {other:?}"),
        }
    }

    #[test]
    fn black_pixel_clears_its_bit_and_only_it() {
        let mut p = panel();
        p.set_pixel(0, 299, Mono::Black);
        // Bottom-left maps to byte 0 bit 7
        assert_eq!(p.buffer()[0], 0x7F);
        assert!(p.buffer()[1..].iter().all(|b| *b == 0xFF));
        p.set_pixel(0, 299, Mono::White);
        assert_eq!(p.buffer()[0], 0xFF);
    }

    #[test]
    fn out_of_bounds_draw_is_ignored() {
        let mut p = panel();
        p.set_pixel(400, 0, Mono::Black);
        p.set_pixel(0, 300, Mono::Black);
        assert!(p.buffer().iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn contrast_is_clamped_to_register_range() {
        let mut p = panel();
        p.set_contrast(0xFF).unwrap();
        assert_eq!(p.iface.ops[0], MockOp::Command(0xC0));
        assert_eq!(p.iface.ops[1], MockOp::Data(alloc::vec![0x1F, 0x04]));
    }

    #[test]
    fn draw_target_clear_fills_buffer() {
        let mut p = panel();
        p.clear(Mono::Black).unwrap();
        assert!(p.buffer().iter().all(|b| *b == 0x00));
        p.clear(Mono::White).unwrap();
        assert!(p.buffer().iter().all(|b| *b == 0xFF));
    }
}
