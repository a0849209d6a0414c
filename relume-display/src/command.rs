//! Controller command bytes and the power-on sequence
//!
//! The panel speaks an ST7306-style command set over 4-wire SPI. The
//! init sequence below is the vendor-tuned one for this module: the
//! voltage and gate tables (0xC1..0xC5, 0xB3/0xB4) are panel specific
//! and must be sent verbatim.

/// Sleep out; needs a settling delay before further commands
pub const SLEEP_OUT: u8 = 0x11;
/// Display inversion on (reflective panel draws inverted)
pub const INVERSION_ON: u8 = 0x21;
/// Display on
pub const DISPLAY_ON: u8 = 0x29;
/// Column address window
pub const COLUMN_ADDRESS: u8 = 0x2A;
/// Row address window
pub const ROW_ADDRESS: u8 = 0x2B;
/// Start framebuffer write
pub const MEMORY_WRITE: u8 = 0x2C;
/// Tearing effect line on
pub const TEARING_ON: u8 = 0x35;
/// Memory access control (scan order)
pub const MADCTL: u8 = 0x36;
/// Leave idle mode (full grayscale drive)
pub const IDLE_OFF: u8 = 0x38;
/// Interface pixel format
pub const PIXEL_FORMAT: u8 = 0x3A;
/// VCOM voltage pair; first byte is the contrast level
pub const VCOM_CONTROL: u8 = 0xC0;

/// Column window payload covering the full 400px width
pub const COLUMN_WINDOW: [u8; 2] = [0x12, 0x2A];
/// Row window payload covering the full 300px height
pub const ROW_WINDOW: [u8; 2] = [0x00, 0xC7];

/// Contrast ceiling accepted by the VCOM register
pub const CONTRAST_MAX: u8 = 0x1F;
/// Factory VCOM level; below 0x0C or above 0x16 the image washes out
pub const CONTRAST_DEFAULT: u8 = 0x11;
/// Usable tuning band around the factory level
pub const CONTRAST_SWEET_SPOT: core::ops::RangeInclusive<u8> = 0x0D..=0x15;
/// Fixed VCOM low byte paired with every contrast write
pub const VCOM_LOW: u8 = 0x04;

/// Settling delay after [`SLEEP_OUT`]
pub const SLEEP_OUT_DELAY_MS: u32 = 200;

/// One step of the init sequence
pub struct InitOp {
    pub command: u8,
    pub data: &'static [u8],
    pub delay_after_ms: u32,
}

const fn op(command: u8, data: &'static [u8]) -> InitOp {
    InitOp {
        command,
        data,
        delay_after_ms: 0,
    }
}

/// Vendor power-on sequence, sent after the hardware reset pulse
pub const INIT_SEQUENCE: &[InitOp] = &[
    op(0xD6, &[0x17, 0x02]),
    op(0xD1, &[0x01]),
    op(VCOM_CONTROL, &[CONTRAST_DEFAULT, VCOM_LOW]),
    op(0xC1, &[0x69, 0x69, 0x69, 0x69]),
    op(0xC2, &[0x19, 0x19, 0x19, 0x19]),
    op(0xC4, &[0x4B, 0x4B, 0x4B, 0x4B]),
    op(0xC5, &[0x19, 0x19, 0x19, 0x19]),
    op(0xD8, &[0x80, 0xE9]),
    op(0xB2, &[0x02]),
    op(
        0xB3,
        &[0xE5, 0xF6, 0x05, 0x46, 0x77, 0x77, 0x77, 0x77, 0x76, 0x45],
    ),
    op(0xB4, &[0x05, 0x46, 0x77, 0x77, 0x77, 0x77, 0x76, 0x45]),
    op(0x62, &[0x32, 0x03, 0x1F]),
    op(0xB7, &[0x13]),
    op(0xB0, &[0x64]),
    InitOp {
        command: SLEEP_OUT,
        data: &[],
        delay_after_ms: SLEEP_OUT_DELAY_MS,
    },
    op(0xC9, &[0x00]),
    op(MADCTL, &[0x48]),
    op(PIXEL_FORMAT, &[0x11]),
    op(0xB9, &[0x20]),
    op(0xB8, &[0x29]),
    op(INVERSION_ON, &[]),
    op(COLUMN_ADDRESS, &COLUMN_WINDOW),
    op(ROW_ADDRESS, &ROW_WINDOW),
    op(TEARING_ON, &[0x00]),
    op(0xD0, &[0xFF]),
    op(IDLE_OFF, &[]),
    op(DISPLAY_ON, &[]),
];
