//! Firmware-side implementations of the core service traits

pub mod clock;
pub mod memostore;
pub mod tools;
pub mod weather;
