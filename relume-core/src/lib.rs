//! Board-agnostic core logic for the Relume companion device
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Device/voice state gating rules
//! - Wall-clock sync state, backoff and drift protection
//! - The background update poller (one-second cadence state machine)
//! - Reminder list, persistence format and alarm matching
//! - Battery calibration math and low-battery hysteresis
//! - Scroll/marquee planning for overflowing labels
//! - Service traits implemented by the firmware crate

#![no_std]
#![deny(unsafe_code)]

pub mod battery;
pub mod clock;
pub mod memo;
pub mod poller;
pub mod power;
pub mod scroll;
pub mod state;
pub mod traits;
