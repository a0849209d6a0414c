//! Pixel coordinate to framebuffer position mapping
//!
//! The controller does not store pixels in row-major order: each
//! framebuffer byte interleaves a 4x2 (portrait) or 2x4 (landscape)
//! block of pixels, and the landscape scan additionally runs bottom-up.
//! Computing the byte index and bit mask per pixel costs a handful of
//! shifts, but the flush path touches every pixel of a 120k-pixel
//! frame, so the mapping is precomputed once into a lookup table.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Which way the panel is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// 300 wide, byte covers a 4x2 pixel block
    Portrait,
    /// 400 wide, byte covers a 2x4 block, rows scanned bottom-up
    Landscape,
}

impl Orientation {
    /// The mounting the vendor firmware infers from the logical width
    pub fn for_width(width: u16) -> Self {
        if width == 400 {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// One LUT entry: byte index in the low 24 bits, bit mask in the top 8
#[derive(Clone, Copy)]
struct Entry(u32);

impl Entry {
    fn new(index: u32, mask: u8) -> Self {
        Entry(index << 8 | mask as u32)
    }

    fn index(self) -> usize {
        (self.0 >> 8) as usize
    }

    fn mask(self) -> u8 {
        self.0 as u8
    }
}

/// Precomputed (x, y) to (byte, mask) table for one orientation
pub struct PixelMapper {
    width: u16,
    height: u16,
    lut: Box<[Entry]>,
}

impl PixelMapper {
    /// Build the table; dimensions must be non-zero multiples of 4
    pub fn new(width: u16, height: u16, orientation: Orientation) -> Option<Self> {
        if width == 0 || height == 0 || width % 4 != 0 || height % 4 != 0 {
            return None;
        }
        let mut lut = Vec::with_capacity(width as usize * height as usize);
        for x in 0..width as u32 {
            for y in 0..height as u32 {
                let (index, bit) = match orientation {
                    Orientation::Portrait => {
                        let index = (y >> 1) * (width as u32 >> 2) + (x >> 2);
                        let bit = 7 - (((x & 3) << 1) | (y & 1));
                        (index, bit)
                    }
                    Orientation::Landscape => {
                        let iy = height as u32 - 1 - y;
                        let index = (x >> 1) * (height as u32 >> 2) + (iy >> 2);
                        let bit = 7 - (((iy & 3) << 1) | (x & 1));
                        (index, bit)
                    }
                };
                lut.push(Entry::new(index, 1 << bit));
            }
        }
        Some(Self {
            width,
            height,
            lut: lut.into_boxed_slice(),
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Framebuffer size in bytes
    pub fn buffer_len(&self) -> usize {
        self.width as usize * self.height as usize / 8
    }

    /// Byte index and bit mask for a pixel; `None` outside the panel
    #[inline]
    pub fn locate(&self, x: u16, y: u16) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let entry = self.lut[x as usize * self.height as usize + y as usize];
        Some((entry.index(), entry.mask()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_from_width() {
        assert_eq!(Orientation::for_width(400), Orientation::Landscape);
        assert_eq!(Orientation::for_width(300), Orientation::Portrait);
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(PixelMapper::new(0, 300, Orientation::Landscape).is_none());
        assert!(PixelMapper::new(400, 0, Orientation::Landscape).is_none());
        assert!(PixelMapper::new(401, 300, Orientation::Landscape).is_none());
        assert!(PixelMapper::new(400, 302, Orientation::Landscape).is_none());
    }

    #[test]
    fn landscape_known_positions() {
        let m = PixelMapper::new(400, 300, Orientation::Landscape).unwrap();
        // Top-left pixel: x=0, y=0 -> iy=299, index = 0*75 + 74, bit 7-((3<<1)|0)=1
        assert_eq!(m.locate(0, 0), Some((74, 1 << 1)));
        // Bottom-left: y=299 -> iy=0, index 0, bit 7
        assert_eq!(m.locate(0, 299), Some((0, 1 << 7)));
        // Bottom-right: x=399, y=299 -> iy=0, index 199*75, bit 7-1=6
        assert_eq!(m.locate(399, 299), Some((199 * 75, 1 << 6)));
        // Last byte: x=399, y=0 -> iy=299, index 199*75+74
        assert_eq!(m.buffer_len(), 15_000);
        let (idx, _) = m.locate(399, 0).unwrap();
        assert_eq!(idx, m.buffer_len() - 1);
    }

    #[test]
    fn portrait_known_positions() {
        let m = PixelMapper::new(300, 400, Orientation::Portrait).unwrap();
        // Origin: index 0, bit 7
        assert_eq!(m.locate(0, 0), Some((0, 1 << 7)));
        // x=3, y=1: index 0, bit 7-((3<<1)|1)=0
        assert_eq!(m.locate(3, 1), Some((0, 1 << 0)));
        // Next byte block to the right
        assert_eq!(m.locate(4, 0), Some((1, 1 << 7)));
        // Next block row down: y=2 -> index = 1*75
        assert_eq!(m.locate(0, 2), Some((75, 1 << 7)));
        let (idx, _) = m.locate(299, 399).unwrap();
        assert_eq!(idx, m.buffer_len() - 1);
    }

    #[test]
    fn out_of_bounds_is_none() {
        let m = PixelMapper::new(400, 300, Orientation::Landscape).unwrap();
        assert_eq!(m.locate(400, 0), None);
        assert_eq!(m.locate(0, 300), None);
    }

    /// Every pixel must land on a distinct (byte, bit) slot inside the
    /// buffer, in both orientations, or the interleave math is wrong
    #[test]
    fn mapping_is_a_bijection() {
        for (w, h, o) in [
            (400u16, 300u16, Orientation::Landscape),
            (300, 400, Orientation::Portrait),
        ] {
            let m = PixelMapper::new(w, h, o).unwrap();
            let mut seen = alloc::vec![0u8; m.buffer_len()];
            for x in 0..w {
                for y in 0..h {
                    let (index, mask) = m.locate(x, y).unwrap();
                    assert!(index < m.buffer_len());
                    assert_eq!(mask.count_ones(), 1);
                    assert_eq!(seen[index] & mask, 0, "double-mapped slot at ({x},{y})");
                    seen[index] |= mask;
                }
            }
            assert!(seen.iter().all(|b| *b == 0xFF));
        }
    }
}
