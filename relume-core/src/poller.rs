//! Background update poller
//!
//! One task owns this state machine and calls [`UpdatePoller::poll`]
//! roughly once a second. Each call runs the full update pass: time
//! sync, drift protection, per-minute clock refresh, alarm matching,
//! weather, the secondary status refresh and power-saving evaluation.
//! The return value is how long the caller should sleep before the
//! next pass.
//!
//! All blocking concerns live behind the traits in [`crate::traits`];
//! nothing here touches hardware directly, which is what makes the
//! whole schedule testable on the host.

use crate::battery::{AlertEdge, BatteryIcon, LowBatteryAlert, CACHE_WINDOW_MS};
use crate::clock::{CivilTime, DriftVerdict, TimeSyncState, RTC_EPOCH_FLOOR, SYNC_SANITY_YEAR};
use crate::memo::MemoPad;
use crate::power::PowerMonitor;
use crate::state::DeviceState;
use crate::traits::{
    AlertSink, BatteryGauge, BatteryReading, DeviceStateSource, DisplaySurface, EnvReading,
    EnvSensor, HardwareRtc, KvStore, SharedSurface, SoundCue, TimeService, WeatherService,
    WifiIcon,
};

/// Continuous Idle time required before background network work
pub const IDLE_GUARD_MS: u32 = 5_000;
/// Weather refresh interval after a successful fetch
pub const WEATHER_OK_INTERVAL_MS: u32 = 10 * 60 * 1_000;
/// Weather retry interval after a failed fetch
pub const WEATHER_RETRY_INTERVAL_MS: u32 = 5 * 60 * 1_000;
/// Secondary status refresh floor while a voice session is active
pub const SESSION_REFRESH_MS: u32 = 5_000;
/// Temperature delta (tenths of a degree) worth redrawing
pub const ENV_TEMP_DELTA_X10: i16 = 2;
/// Humidity delta (tenths of a percent) worth redrawing
pub const ENV_HUMIDITY_DELTA_X10: u16 = 10;

/// Everything the poller talks to, grouped so `poll` stays callable
pub struct Services<'a, T, R, W, E, B, A, D, K>
where
    T: TimeService,
    R: HardwareRtc,
    W: WeatherService,
    E: EnvSensor,
    B: BatteryGauge,
    A: AlertSink,
    D: DeviceStateSource,
    K: KvStore,
{
    pub time: &'a mut T,
    pub rtc: &'a mut R,
    pub weather: &'a mut W,
    pub env: &'a mut E,
    pub battery: &'a mut B,
    pub alerts: &'a mut A,
    pub state: &'a D,
    pub memos: &'a mut MemoPad<K>,
}

/// Per-second update schedule and its accumulated state
pub struct UpdatePoller {
    sync: TimeSyncState,
    power: PowerMonitor,
    utc_offset_secs: i32,
    force_refresh: bool,
    last_minute: Option<u16>,
    last_alarm_minute: Option<u16>,
    last_state: DeviceState,
    idle_since_ms: Option<u32>,
    last_weather_ms: Option<u32>,
    weather_ok: bool,
    battery_cache: Option<(u32, BatteryReading)>,
    low_battery: LowBatteryAlert,
    last_secondary_ms: Option<u32>,
    last_env: Option<EnvReading>,
    last_battery_shown: Option<(BatteryIcon, u8)>,
    last_wifi: Option<WifiIcon>,
    assistant_shown: Option<DeviceState>,
}

impl UpdatePoller {
    pub fn new(now_ms: u32, utc_offset_secs: i32) -> Self {
        Self {
            sync: TimeSyncState::new(),
            power: PowerMonitor::new(now_ms),
            utc_offset_secs,
            force_refresh: true,
            last_minute: None,
            last_alarm_minute: None,
            last_state: DeviceState::Unknown,
            idle_since_ms: None,
            last_weather_ms: None,
            weather_ok: false,
            battery_cache: None,
            low_battery: LowBatteryAlert::new(),
            last_secondary_ms: None,
            last_env: None,
            last_battery_shown: None,
            last_wifi: None,
            assistant_shown: None,
        }
    }

    /// Restore the system clock from the hardware RTC after power-on
    ///
    /// The RTC keeps time through deep sleep and battery swaps; anything
    /// at or below the floor is a dead-battery default and is ignored.
    pub fn bootstrap(&mut self, time: &mut impl TimeService, rtc: &mut impl HardwareRtc) {
        if let Some(epoch) = rtc.read_epoch() {
            if epoch > RTC_EPOCH_FLOOR {
                time.set_epoch(epoch);
            }
        }
    }

    /// Stamp user activity (button press); cancels power saving
    pub fn note_activity(&mut self, now_ms: u32) {
        self.power.note_activity(now_ms);
    }

    pub fn time_synced(&self) -> bool {
        self.sync.synced()
    }

    pub fn power_saving(&self) -> bool {
        self.power.power_saving()
    }

    /// Run one update pass; returns the sleep before the next
    pub fn poll<T, R, W, E, B, A, D, K>(
        &mut self,
        svc: &mut Services<'_, T, R, W, E, B, A, D, K>,
        ui: &impl SharedSurface,
    ) -> u32
    where
        T: TimeService,
        R: HardwareRtc,
        W: WeatherService,
        E: EnvSensor,
        B: BatteryGauge,
        A: AlertSink,
        D: DeviceStateSource,
        K: KvStore,
    {
        let now = svc.time.now_ms();
        let state = svc.state.current();
        if state != self.last_state {
            self.power.note_activity(now);
        }

        // Idle guard: network work waits for a quiet stretch so it never
        // competes with a voice session that just ended
        self.idle_since_ms = match (state, self.idle_since_ms) {
            (DeviceState::Idle, Some(at)) => Some(at),
            (DeviceState::Idle, None) => Some(now),
            _ => None,
        };
        let idle_settled = self
            .idle_since_ms
            .is_some_and(|at| now.wrapping_sub(at) >= IDLE_GUARD_MS);

        let mut extra_sleep = 0;
        if state.network_connected() && idle_settled && self.sync.should_sync(now) {
            svc.time.sync_network_time();
            // The sync call reports nothing; a plausible civil year means
            // the clock actually moved
            let epoch = svc.time.now_epoch();
            if CivilTime::from_epoch(epoch, self.utc_offset_secs).year >= SYNC_SANITY_YEAR {
                self.sync.record_success(now, epoch);
                svc.rtc.write_epoch(epoch);
            } else {
                extra_sleep = self.sync.record_failure();
            }
        }

        // Drift protection: something external rewrote the system clock,
        // fall back to the battery-backed RTC if it holds real time
        let epoch = svc.time.now_epoch();
        if let DriftVerdict::Tampered(_) = self.sync.check_drift(epoch) {
            if let Some(rtc_epoch) = svc.rtc.read_epoch() {
                if rtc_epoch > RTC_EPOCH_FLOOR {
                    svc.time.set_epoch(rtc_epoch);
                }
            }
        }
        let epoch = svc.time.now_epoch();
        self.sync.track_epoch(epoch);

        let civil = CivilTime::from_epoch(epoch, self.utc_offset_secs);
        let minute_of_day = civil.hour as u16 * 60 + civil.minute as u16;

        if self.force_refresh || self.last_minute != Some(minute_of_day) {
            let hhmm = civil.hhmm();
            let ran = ui.try_with(now, &mut |s: &mut dyn DisplaySurface| {
                s.set_clock(hhmm.as_str(), civil.second);
                s.set_calendar(civil.year, civil.month, civil.day, civil.weekday_name());
            });
            // A blocked refresh retries next pass rather than being lost
            if ran {
                self.last_minute = Some(minute_of_day);
                self.force_refresh = false;
            }
        }

        // Alarms run on their own minute tracker so a held display lock
        // can never delay or duplicate them; the scan itself happens
        // outside any lock
        if self.sync.synced() && self.last_alarm_minute != Some(minute_of_day) {
            self.last_alarm_minute = Some(minute_of_day);
            let hhmm = civil.hhmm();
            let fired = svc.memos.list_mut().scan_alarms(hhmm.as_str());
            if !fired.is_empty() {
                for reminder in fired.iter() {
                    svc.alerts.alert("Reminder", reminder.text.as_str());
                }
                svc.alerts.play_sound(SoundCue::Reminder);
                // Fired entries are already gone from the in-memory list;
                // a failed persist just means they return after reboot
                let _ = svc.memos.save();
                let memos = &*svc.memos;
                ui.with(&mut |s: &mut dyn DisplaySurface| s.refresh_memos(memos.list()));
            }
        }

        if state == DeviceState::Idle && idle_settled {
            let interval = if self.weather_ok {
                WEATHER_OK_INTERVAL_MS
            } else {
                WEATHER_RETRY_INTERVAL_MS
            };
            let due = self
                .last_weather_ms
                .is_none_or(|at| now.wrapping_sub(at) >= interval);
            if due {
                self.weather_ok = svc.weather.update();
                self.last_weather_ms = Some(now);
                if self.weather_ok {
                    let weather = &*svc.weather;
                    ui.try_with(now, &mut |s: &mut dyn DisplaySurface| {
                        s.set_weather(weather.latest());
                    });
                }
            }
        }

        // Secondary refresh: sensor readouts and status icons. Throttled
        // while a voice session is active so audio streaming keeps the bus
        let secondary_due = if state.voice_session_active() {
            self.last_secondary_ms
                .is_none_or(|at| now.wrapping_sub(at) >= SESSION_REFRESH_MS)
        } else {
            true
        };
        if secondary_due {
            self.last_secondary_ms = Some(now);
            self.secondary_refresh(now, state, svc, ui);
        }

        self.last_state = state;
        if self.power.evaluate(now, state) && self.power.power_saving() {
            // Entering power saving leaves the current image on the panel;
            // the next activity forces a full repaint
            self.force_refresh = true;
        }
        self.power.refresh_interval_ms() + extra_sleep
    }

    fn secondary_refresh<T, R, W, E, B, A, D, K>(
        &mut self,
        now: u32,
        state: DeviceState,
        svc: &mut Services<'_, T, R, W, E, B, A, D, K>,
        ui: &impl SharedSurface,
    ) where
        T: TimeService,
        R: HardwareRtc,
        W: WeatherService,
        E: EnvSensor,
        B: BatteryGauge,
        A: AlertSink,
        D: DeviceStateSource,
        K: KvStore,
    {
        // Gauge reads are cached: an ADC burst every pass would dominate
        // the loop for a value that moves over minutes
        let battery = match self.battery_cache {
            Some((at, cached)) if now.wrapping_sub(at) < CACHE_WINDOW_MS => Some(cached),
            _ => {
                let fresh = svc.battery.read();
                if let Some(r) = fresh {
                    self.battery_cache = Some((now, r));
                }
                fresh
            }
        };

        if let Some(b) = battery {
            if let Some(edge) = self.low_battery.update(b.level, b.charging, b.discharging) {
                if edge == AlertEdge::Show {
                    svc.alerts.alert("Low battery", "Connect the charger");
                    svc.alerts.play_sound(SoundCue::LowBattery);
                }
                ui.with(&mut |s: &mut dyn DisplaySurface| {
                    s.set_low_battery_visible(edge == AlertEdge::Show);
                });
            }
        }

        let env = svc.env.read();
        let env_changed = match (env, self.last_env) {
            (Some(e), Some(prev)) => {
                (e.temp_c_x10 - prev.temp_c_x10).abs() >= ENV_TEMP_DELTA_X10
                    || e.humidity_x10.abs_diff(prev.humidity_x10) >= ENV_HUMIDITY_DELTA_X10
            }
            (Some(_), None) => true,
            (None, _) => false,
        };

        let battery_shown =
            battery.map(|b| (BatteryIcon::for_reading(b.level, b.charging), b.level));
        let battery_changed = battery_shown.is_some() && battery_shown != self.last_battery_shown;

        let wifi = match state {
            DeviceState::WifiConfiguring => WifiIcon::Configuring,
            s if s.network_connected() => WifiIcon::Connected,
            _ => WifiIcon::Off,
        };
        let wifi_changed = self.last_wifi != Some(wifi);
        let assistant_changed = self.assistant_shown != Some(state);

        if !(env_changed || battery_changed || wifi_changed || assistant_changed) {
            return;
        }

        let ran = ui.try_with(now, &mut |s: &mut dyn DisplaySurface| {
            if env_changed {
                if let Some(e) = env {
                    s.set_env(e);
                }
            }
            if battery_changed {
                if let Some((icon, level)) = battery_shown {
                    s.set_battery(icon, level);
                }
            }
            if wifi_changed {
                s.set_wifi(wifi);
            }
            if assistant_changed {
                s.set_assistant(state.emotion_text(), state.status_text());
            }
        });
        if ran {
            if env_changed {
                self.last_env = env;
            }
            if battery_changed {
                self.last_battery_shown = battery_shown;
            }
            self.last_wifi = Some(wifi);
            self.assistant_shown = Some(state);
        }
    }
}
