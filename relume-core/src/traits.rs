//! Service traits wired up by the firmware crate
//!
//! The poller talks to hardware, network services and the UI only
//! through these traits, which keeps every decision in this crate
//! testable on the host with fake implementations.

use heapless::String;

use crate::battery::BatteryIcon;
use crate::memo::MemoList;
use crate::state::DeviceState;

/// Latest weather fetch result, kept as display-ready strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherReport {
    pub city: String<24>,
    pub condition: String<24>,
    pub temperature: String<8>,
}

/// One temperature/humidity sample, fixed-point tenths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnvReading {
    pub temp_c_x10: i16,
    pub humidity_x10: u16,
}

/// Fuel gauge snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryReading {
    pub level: u8,
    pub charging: bool,
    pub discharging: bool,
}

/// Status-bar network glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WifiIcon {
    Connected,
    Configuring,
    Off,
}

/// Short alert chime played alongside on-screen alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoundCue {
    Reminder,
    LowBattery,
}

/// System clock plus network sync
pub trait TimeService {
    /// Monotonic milliseconds since boot
    fn now_ms(&self) -> u32;
    /// Current Unix epoch seconds from the system clock
    fn now_epoch(&self) -> i64;
    /// Rewrite the system clock
    fn set_epoch(&mut self, epoch: i64);
    /// Kick a network time sync; completion is verified by reading the
    /// clock back, the call itself reports nothing
    fn sync_network_time(&mut self);
}

/// Battery-backed external RTC
pub trait HardwareRtc {
    fn read_epoch(&mut self) -> Option<i64>;
    fn write_epoch(&mut self, epoch: i64);
}

/// Weather fetcher with a cached last report
pub trait WeatherService {
    /// Fetch and cache; `true` on success
    fn update(&mut self) -> bool;
    fn latest(&self) -> &WeatherReport;
}

/// Ambient temperature/humidity sensor
pub trait EnvSensor {
    fn read(&mut self) -> Option<EnvReading>;
}

/// Battery fuel gauge
pub trait BatteryGauge {
    fn read(&mut self) -> Option<BatteryReading>;
}

/// Alert popups and chimes
pub trait AlertSink {
    fn alert(&mut self, title: &str, body: &str);
    fn play_sound(&mut self, cue: SoundCue);
}

/// Flat byte-oriented key-value store
pub trait KvStore {
    /// Read a value into `buf`; `None` when absent
    fn get(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Option<usize>;
    fn set(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(), ()>;
    fn erase(&self, namespace: &str, key: &str) -> Result<(), ()>;
}

/// Source of the current voice-pipeline state
pub trait DeviceStateSource {
    fn current(&self) -> DeviceState;
}

/// Everything the poller writes to the screen
///
/// Implemented by the retained scene; object-safe so the firmware can
/// hand the poller a `&mut dyn DisplaySurface` under its lock.
pub trait DisplaySurface {
    fn set_clock(&mut self, hhmm: &str, second: u8);
    fn set_calendar(&mut self, year: u16, month: u8, day: u8, weekday: &str);
    fn set_env(&mut self, reading: EnvReading);
    fn set_weather(&mut self, report: &WeatherReport);
    fn set_battery(&mut self, icon: BatteryIcon, level: u8);
    fn set_wifi(&mut self, icon: WifiIcon);
    fn set_assistant(&mut self, emotion: &str, status: Option<&'static str>);
    fn set_low_battery_visible(&mut self, visible: bool);
    fn refresh_memos(&mut self, list: &MemoList);
}

/// Lock-guarded access to the shared [`DisplaySurface`]
///
/// `try_with` is the poller's entry point: it refuses to run while a
/// full-screen overlay owns the panel. `with` bypasses the overlay gate
/// for writes that must land regardless, like the memo list after an
/// alarm fired.
pub trait SharedSurface {
    /// Run `f` under the lock unless an overlay is active; reports
    /// whether `f` ran
    fn try_with(&self, now_ms: u32, f: &mut dyn FnMut(&mut dyn DisplaySurface)) -> bool;
    /// Run `f` under the lock unconditionally
    fn with(&self, f: &mut dyn FnMut(&mut dyn DisplaySurface));
}
