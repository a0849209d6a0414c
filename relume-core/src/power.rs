//! Idle tracking and refresh cadence
//!
//! After five minutes without a state change or button press the poller
//! slows its loop from 1s to 5s. The reflective panel keeps its image
//! without refreshes, so a sleepy loop costs nothing visually.

use crate::state::DeviceState;

/// Continuous idle time before the loop slows down
pub const IDLE_TIMEOUT_MS: u32 = 5 * 60 * 1_000;
/// Loop interval while active
pub const NORMAL_REFRESH_MS: u32 = 1_000;
/// Loop interval while power saving
pub const SAVING_REFRESH_MS: u32 = 5_000;

/// Tracks activity and decides the poll interval
#[derive(Debug, Clone)]
pub struct PowerMonitor {
    power_saving: bool,
    last_activity_ms: u32,
}

impl PowerMonitor {
    pub fn new(now_ms: u32) -> Self {
        Self {
            power_saving: false,
            last_activity_ms: now_ms,
        }
    }

    pub fn power_saving(&self) -> bool {
        self.power_saving
    }

    /// Stamp user or pipeline activity; wakes the loop immediately
    pub fn note_activity(&mut self, now_ms: u32) {
        self.last_activity_ms = now_ms;
        self.power_saving = false;
    }

    /// Re-evaluate the mode at the end of a poll iteration
    ///
    /// Returns `true` when the mode flipped this call.
    pub fn evaluate(&mut self, now_ms: u32, state: DeviceState) -> bool {
        if state != DeviceState::Idle {
            let was = self.power_saving;
            self.note_activity(now_ms);
            return was;
        }
        if !self.power_saving && now_ms.wrapping_sub(self.last_activity_ms) >= IDLE_TIMEOUT_MS {
            self.power_saving = true;
            return true;
        }
        false
    }

    pub fn refresh_interval_ms(&self) -> u32 {
        if self.power_saving {
            SAVING_REFRESH_MS
        } else {
            NORMAL_REFRESH_MS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enters_saving_after_timeout() {
        let mut pm = PowerMonitor::new(0);
        assert!(!pm.evaluate(IDLE_TIMEOUT_MS - 1, DeviceState::Idle));
        assert!(!pm.power_saving());
        assert!(pm.evaluate(IDLE_TIMEOUT_MS, DeviceState::Idle));
        assert!(pm.power_saving());
        assert_eq!(pm.refresh_interval_ms(), SAVING_REFRESH_MS);
    }

    #[test]
    fn any_non_idle_state_resets_the_clock() {
        let mut pm = PowerMonitor::new(0);
        pm.evaluate(IDLE_TIMEOUT_MS, DeviceState::Idle);
        assert!(pm.power_saving());
        // Voice activity wakes it up
        assert!(pm.evaluate(IDLE_TIMEOUT_MS + 1_000, DeviceState::Listening));
        assert!(!pm.power_saving());
        assert_eq!(pm.refresh_interval_ms(), NORMAL_REFRESH_MS);
        // And the idle countdown starts over
        assert!(!pm.evaluate(IDLE_TIMEOUT_MS + 2_000, DeviceState::Idle));
    }

    #[test]
    fn button_press_counts_as_activity() {
        let mut pm = PowerMonitor::new(0);
        pm.note_activity(IDLE_TIMEOUT_MS - 1_000);
        assert!(!pm.evaluate(IDLE_TIMEOUT_MS + 1_000, DeviceState::Idle));
        assert!(pm.evaluate(2 * IDLE_TIMEOUT_MS - 1_000, DeviceState::Idle));
    }

    #[test]
    fn mode_flip_reported_once() {
        let mut pm = PowerMonitor::new(0);
        assert!(pm.evaluate(IDLE_TIMEOUT_MS, DeviceState::Idle));
        assert!(!pm.evaluate(IDLE_TIMEOUT_MS + 5_000, DeviceState::Idle));
    }
}
