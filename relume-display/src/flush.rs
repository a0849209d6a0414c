//! RGB565 to 1-bit blitting
//!
//! The voice pipeline's renderer hands over RGB565 regions; the panel
//! only knows black and white. Anything darker than mid-gray (raw value
//! below [`BLACK_THRESHOLD`]) becomes black, everything else white.

use crate::color::Mono;
use crate::error::Error;
use crate::interface::DisplayInterface;
use crate::panel::PanelDriver;

/// Raw RGB565 values below this render as black
pub const BLACK_THRESHOLD: u16 = 0x7FFF;

/// Threshold one raw RGB565 pixel
#[inline]
pub fn quantize(raw: u16) -> Mono {
    if raw < BLACK_THRESHOLD {
        Mono::Black
    } else {
        Mono::White
    }
}

impl<I: DisplayInterface> PanelDriver<I> {
    /// Blit a row-major RGB565 region at (x0, y0) and present the frame
    ///
    /// `pixels` holds `w * h` raw values. The whole frame is flushed
    /// afterwards, mirroring how the upstream renderer drives the panel
    /// once per dirty region.
    pub fn blit_rgb565(
        &mut self,
        x0: u16,
        y0: u16,
        w: u16,
        h: u16,
        pixels: &[u16],
    ) -> Result<(), Error<I>> {
        debug_assert_eq!(pixels.len(), w as usize * h as usize);
        let mut src = pixels.iter();
        for y in y0..y0.saturating_add(h) {
            for x in x0..x0.saturating_add(w) {
                match src.next() {
                    Some(raw) => self.set_pixel(x, y, quantize(*raw)),
                    None => break,
                }
            }
        }
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::{panel, MockOp};

    #[test]
    fn threshold_boundary() {
        assert_eq!(quantize(0x0000), Mono::Black);
        assert_eq!(quantize(0x7FFE), Mono::Black);
        assert_eq!(quantize(0x7FFF), Mono::White);
        assert_eq!(quantize(0xFFFF), Mono::White);
    }

    #[test]
    fn blit_thresholds_and_flushes() {
        let mut p = panel();
        // 2x2 region at the bottom-left corner: dark, light / light, dark
        let region = [0x0000u16, 0xFFFF, 0x8000, 0x1234];
        p.blit_rgb565(0, 298, 2, 2, &region).unwrap();

        // (0,298) black, (1,298) white, (0,299) white, (1,299) black
        // All four land in framebuffer byte 0 (landscape 2x4 block):
        // (0,299)->bit7, (1,299)->bit6, (0,298)->bit5, (1,298)->bit4
        assert_eq!(p.buffer()[0] & 0xF0, 0b1001_0000);

        // Frame was presented
        assert!(p
            .iface()
            .ops
            .iter()
            .any(|op| *op == MockOp::Command(0x2C)));
    }

    #[test]
    fn blit_clips_at_panel_edge() {
        let mut p = panel();
        let region = [0x0000u16; 4];
        p.blit_rgb565(399, 299, 2, 2, &region).unwrap();
        // Only the single in-bounds pixel changed
        let dark_bytes = p.buffer().iter().filter(|b| **b != 0xFF).count();
        assert_eq!(dark_bytes, 1);
    }
}
