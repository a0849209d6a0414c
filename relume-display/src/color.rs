//! 1-bit color type

use embedded_graphics::pixelcolor::raw::RawU1;
use embedded_graphics::pixelcolor::PixelColor;

/// The two states a reflective LCD pixel can take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mono {
    Black,
    White,
}

impl Mono {
    pub fn is_white(self) -> bool {
        self == Mono::White
    }

    /// Invert, for highlighted regions
    pub fn invert(self) -> Self {
        match self {
            Mono::Black => Mono::White,
            Mono::White => Mono::Black,
        }
    }
}

impl PixelColor for Mono {
    type Raw = RawU1;
}

impl From<RawU1> for Mono {
    fn from(raw: RawU1) -> Self {
        use embedded_graphics::pixelcolor::raw::RawData;
        if raw.into_inner() == 0 {
            Mono::Black
        } else {
            Mono::White
        }
    }
}

impl From<Mono> for RawU1 {
    fn from(color: Mono) -> Self {
        RawU1::new(color.is_white() as u8)
    }
}
