//! Wall-clock synchronization state and drift protection
//!
//! The device has three time sources: the network time service (good but
//! not always reachable), the hardware RTC (survives power loss) and the
//! system clock (what everything reads). This module tracks whether the
//! system clock has been synced, schedules re-sync with exponential
//! backoff, and detects external tampering of the system clock so the
//! poller can restore it from the RTC.

use core::fmt::Write as _;

use heapless::String;

/// Give up first-time sync after this many failed attempts
pub const SYNC_MAX_RETRIES: u8 = 5;
/// Initial backoff after a failed sync, doubled per failure
pub const SYNC_RETRY_INITIAL_MS: u32 = 1_000;
/// Backoff ceiling (1s, 2s, 4s, 8s, 16s)
pub const SYNC_RETRY_MAX_MS: u32 = 16_000;
/// Re-sync a healthy clock once a day
pub const RESYNC_INTERVAL_MS: u32 = 24 * 60 * 60 * 1_000;
/// Epoch delta treated as external tampering rather than drift
pub const DRIFT_LIMIT_SECS: i64 = 7_200;
/// RTC readings at or below this epoch are power-on defaults, not time
pub const RTC_EPOCH_FLOOR: i64 = 1_700_000_000;
/// The sync call reports no status; a civil year at or past this means
/// the system clock actually moved
pub const SYNC_SANITY_YEAR: u16 = 2024;

/// Verdict of the per-iteration drift check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriftVerdict {
    /// Epoch advanced as expected since the previous iteration
    InBounds,
    /// Epoch jumped by the contained delta; restore from RTC
    Tampered(i64),
}

/// Network time sync bookkeeping, owned by the poller
#[derive(Debug, Clone)]
pub struct TimeSyncState {
    synced: bool,
    retry_count: u8,
    retry_delay_ms: u32,
    last_sync_ms: Option<u32>,
    last_valid_epoch: Option<i64>,
}

impl Default for TimeSyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSyncState {
    pub fn new() -> Self {
        Self {
            synced: false,
            retry_count: 0,
            retry_delay_ms: SYNC_RETRY_INITIAL_MS,
            last_sync_ms: None,
            last_valid_epoch: None,
        }
    }

    /// Whether the system clock has ever been verified against the network
    pub fn synced(&self) -> bool {
        self.synced
    }

    /// Whether a sync attempt is due this iteration
    ///
    /// First-time sync retries until the attempt budget is spent; after
    /// that the device runs on its hardware RTC. A healthy clock is
    /// re-verified once per [`RESYNC_INTERVAL_MS`].
    pub fn should_sync(&self, now_ms: u32) -> bool {
        if !self.synced {
            self.retry_count < SYNC_MAX_RETRIES
        } else {
            match self.last_sync_ms {
                Some(at) => now_ms.wrapping_sub(at) > RESYNC_INTERVAL_MS,
                None => false,
            }
        }
    }

    /// Record a verified sync: reset retry state, stamp the epoch
    pub fn record_success(&mut self, now_ms: u32, epoch: i64) {
        self.synced = true;
        self.retry_count = 0;
        self.retry_delay_ms = SYNC_RETRY_INITIAL_MS;
        self.last_sync_ms = Some(now_ms);
        self.last_valid_epoch = Some(epoch);
    }

    /// Record a failed attempt; returns the backoff to wait before the next
    pub fn record_failure(&mut self) -> u32 {
        let delay = self.retry_delay_ms;
        self.retry_count = self.retry_count.saturating_add(1);
        self.retry_delay_ms = (self.retry_delay_ms * 2).min(SYNC_RETRY_MAX_MS);
        delay
    }

    pub fn retries_exhausted(&self) -> bool {
        !self.synced && self.retry_count >= SYNC_MAX_RETRIES
    }

    /// Advance the tracked epoch; call once per iteration after the drift check
    pub fn track_epoch(&mut self, epoch: i64) {
        if self.synced {
            self.last_valid_epoch = Some(epoch);
        }
    }

    /// Compare the observed epoch against the tracked one
    ///
    /// Normal operation advances the epoch by about one second per poll
    /// iteration; a jump past [`DRIFT_LIMIT_SECS`] in either direction
    /// means something external rewrote the system clock.
    pub fn check_drift(&self, now_epoch: i64) -> DriftVerdict {
        if !self.synced {
            return DriftVerdict::InBounds;
        }
        match self.last_valid_epoch {
            Some(tracked) => {
                let delta = now_epoch - tracked;
                if delta < -DRIFT_LIMIT_SECS || delta > DRIFT_LIMIT_SECS {
                    DriftVerdict::Tampered(delta)
                } else {
                    DriftVerdict::InBounds
                }
            }
            None => DriftVerdict::InBounds,
        }
    }
}

/// Names for `CivilTime::weekday` (0 = Sunday)
pub const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Broken-down local time derived from a Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// 0 = Sunday
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CivilTime {
    /// Convert an epoch to local civil time at a fixed UTC offset
    ///
    /// Valid for dates from 1970 through 2099, which covers every epoch
    /// the device can plausibly hold.
    pub fn from_epoch(epoch: i64, utc_offset_secs: i32) -> Self {
        let local = epoch + utc_offset_secs as i64;
        let days = local.div_euclid(86_400);
        let secs = local.rem_euclid(86_400);

        let hour = (secs / 3_600) as u8;
        let minute = ((secs % 3_600) / 60) as u8;
        let second = (secs % 60) as u8;
        // 1970-01-01 was a Thursday
        let weekday = ((days + 4).rem_euclid(7)) as u8;

        // Civil-from-days conversion, era-based
        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
        let y = yoe + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
        let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
        let year = (if month <= 2 { y + 1 } else { y }) as u16;

        Self {
            year,
            month,
            day,
            weekday,
            hour,
            minute,
            second,
        }
    }

    /// Format the current minute as `"HH:MM"`, the alarm-matching key
    pub fn hhmm(&self) -> String<5> {
        let mut s = String::new();
        // Writing 5 ASCII bytes into a 5-byte string cannot fail
        let _ = write!(s, "{:02}:{:02}", self.hour, self.minute);
        s
    }

    pub fn weekday_name(&self) -> &'static str {
        WEEKDAY_NAMES[self.weekday as usize % 7]
    }
}

/// Inverse of [`CivilTime::from_epoch`] at UTC, used when writing the
/// hardware RTC's calendar registers back into an epoch
pub fn epoch_from_civil(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> i64 {
    let y = if month <= 2 {
        year as i64 - 1
    } else {
        year as i64
    };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = month as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days = era * 146_097 + doe - 719_468;
    days * 86_400 + hour as i64 * 3_600 + minute as i64 * 60 + second as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_doubles_and_caps() {
        let mut sync = TimeSyncState::new();
        let mut delays = [0u32; 6];
        for d in delays.iter_mut() {
            *d = sync.record_failure();
        }
        assert_eq!(delays, [1_000, 2_000, 4_000, 8_000, 16_000, 16_000]);
    }

    #[test]
    fn gives_up_after_five_attempts() {
        let mut sync = TimeSyncState::new();
        for _ in 0..SYNC_MAX_RETRIES {
            assert!(sync.should_sync(0));
            sync.record_failure();
        }
        assert!(!sync.should_sync(0));
        assert!(sync.retries_exhausted());
    }

    #[test]
    fn resync_due_after_a_day() {
        let mut sync = TimeSyncState::new();
        sync.record_success(1_000, 1_750_000_000);
        assert!(!sync.should_sync(1_000 + RESYNC_INTERVAL_MS));
        assert!(sync.should_sync(1_000 + RESYNC_INTERVAL_MS + 1));
    }

    #[test]
    fn success_resets_backoff() {
        let mut sync = TimeSyncState::new();
        sync.record_failure();
        sync.record_failure();
        sync.record_success(0, 1_750_000_000);
        assert_eq!(sync.record_failure(), SYNC_RETRY_INITIAL_MS);
    }

    #[test]
    fn drift_three_hours_is_tampering() {
        let mut sync = TimeSyncState::new();
        sync.record_success(0, 1_750_000_000);
        let verdict = sync.check_drift(1_750_000_000 + 3 * 3_600);
        assert_eq!(verdict, DriftVerdict::Tampered(3 * 3_600));
        // Backwards jumps count too
        let verdict = sync.check_drift(1_750_000_000 - 3 * 3_600);
        assert_eq!(verdict, DriftVerdict::Tampered(-3 * 3_600));
    }

    #[test]
    fn drift_one_hour_is_in_bounds() {
        let mut sync = TimeSyncState::new();
        sync.record_success(0, 1_750_000_000);
        assert_eq!(
            sync.check_drift(1_750_000_000 + 3_600),
            DriftVerdict::InBounds
        );
    }

    #[test]
    fn unsynced_clock_never_reports_drift() {
        let sync = TimeSyncState::new();
        assert_eq!(sync.check_drift(0), DriftVerdict::InBounds);
    }

    #[test]
    fn civil_time_known_dates() {
        // 2024-01-01 00:00:00 UTC was a Monday
        let t = CivilTime::from_epoch(1_704_067_200, 0);
        assert_eq!((t.year, t.month, t.day), (2024, 1, 1));
        assert_eq!(t.weekday_name(), "MON");
        assert_eq!((t.hour, t.minute, t.second), (0, 0, 0));

        // 2025-12-31 23:59:59 UTC, a Wednesday
        let t = CivilTime::from_epoch(1_767_225_599, 0);
        assert_eq!((t.year, t.month, t.day), (2025, 12, 31));
        assert_eq!(t.weekday_name(), "WED");
        assert_eq!((t.hour, t.minute, t.second), (23, 59, 59));
    }

    #[test]
    fn civil_time_honors_utc_offset() {
        // 2024-06-15 16:30:00 UTC at +08:00 is 00:30 next day
        let t = CivilTime::from_epoch(1_718_469_000, 8 * 3_600);
        assert_eq!((t.month, t.day), (6, 16));
        assert_eq!(t.hhmm().as_str(), "00:30");
    }

    #[test]
    fn civil_round_trips_through_epoch() {
        for epoch in [0i64, 1_704_067_200, 1_718_469_000, 1_767_225_599, 4_102_444_799] {
            let t = CivilTime::from_epoch(epoch, 0);
            assert_eq!(
                epoch_from_civil(t.year, t.month, t.day, t.hour, t.minute, t.second),
                epoch
            );
        }
    }

    #[test]
    fn hhmm_pads_with_zeros() {
        let t = CivilTime::from_epoch(1_704_067_200 + 7 * 3_600 + 5 * 60, 0);
        assert_eq!(t.hhmm().as_str(), "07:05");
    }
}
