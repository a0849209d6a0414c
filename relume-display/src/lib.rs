//! Driver and retained scene for a 400x300 1-bit reflective LCD
//!
//! The panel is written as a packed 1-bit framebuffer with a vendor
//! pixel interleave, so this crate splits into:
//!
//! - [`mapper`]: precomputed (x, y) to (byte, bit) lookup tables
//! - [`panel`]: the panel driver, framebuffer and full-frame flush
//! - [`flush`]: RGB565 to 1-bit threshold blitting
//! - [`scene`]: the retained desk-clock scene drawn with
//!   `embedded-graphics`, implementing the core display surface trait
//!
//! The LUTs and framebuffer live on the heap (the target keeps them in
//! PSRAM), so the crate needs `alloc`.

#![no_std]

extern crate alloc;

pub mod color;
pub mod command;
pub mod error;
pub mod flush;
pub mod interface;
pub mod mapper;
pub mod panel;
pub mod scene;

pub use color::Mono;
pub use error::Error;
pub use interface::{DisplayInterface, SpiInterface};
pub use mapper::{Orientation, PixelMapper};
pub use panel::PanelDriver;
pub use scene::{Page, Pomodoro, Scene};

/// Native panel resolution in landscape
pub const PANEL_WIDTH: u16 = 400;
pub const PANEL_HEIGHT: u16 = 300;
