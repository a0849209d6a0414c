//! Driver error types

use crate::interface::DisplayInterface;

/// Errors from panel operations
///
/// Generic over the interface so the underlying SPI/GPIO error stays
/// matchable.
pub enum Error<I: DisplayInterface> {
    /// SPI or GPIO failure from the interface layer
    Interface(I::Error),
    /// Width and height must be non-zero multiples of 4
    InvalidDimensions { width: u16, height: u16 },
}

// Hand-written so the bound stays on `I::Error`, not `I`
impl<I: DisplayInterface> core::fmt::Debug for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(e) => f.debug_tuple("Interface").field(e).finish(),
            Self::InvalidDimensions { width, height } => f
                .debug_struct("InvalidDimensions")
                .field("width", width)
                .field("height", height)
                .finish(),
        }
    }
}

impl<I: DisplayInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(e) => write!(f, "interface error: {e:?}"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid panel dimensions {width}x{height}")
            }
        }
    }
}
