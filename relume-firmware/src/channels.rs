//! Inter-task communication statics
//!
//! Embassy-sync primitives shared between the firmware tasks. The
//! assistant link task is the only producer for pipeline-originated
//! data (device state, chat text, weather replies, synced epochs) and
//! the only consumer for outbound requests.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU8, Ordering};

use relume_core::state::DeviceState;
use relume_core::traits::{SoundCue, WeatherReport};

use crate::link::ToolRequest;

/// Capacity for pipeline-originated tool calls
const TOOL_CHANNEL_SIZE: usize = 4;
/// Capacity for outbound alert chimes
const SOUND_CHANNEL_SIZE: usize = 4;

/// Latest voice-pipeline state, readable without locking
///
/// Stored as a compact discriminant so the once-a-second poller can
/// read it from a plain atomic.
static DEVICE_STATE: AtomicU8 = AtomicU8::new(DeviceState::Unknown as u8);

pub fn publish_state(state: DeviceState) {
    DEVICE_STATE.store(state as u8, Ordering::Release);
}

pub fn current_state() -> DeviceState {
    match DEVICE_STATE.load(Ordering::Acquire) {
        0 => DeviceState::Starting,
        1 => DeviceState::WifiConfiguring,
        2 => DeviceState::Connecting,
        3 => DeviceState::Listening,
        4 => DeviceState::Speaking,
        5 => DeviceState::Idle,
        6 => DeviceState::Upgrading,
        7 => DeviceState::Activating,
        8 => DeviceState::FatalError,
        _ => DeviceState::Unknown,
    }
}

/// Button presses and other user activity, consumed by the update task
pub static ACTIVITY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Epoch from the pipeline's network time sync, applied by the update task
pub static SYNCED_EPOCH: Signal<CriticalSectionRawMutex, i64> = Signal::new();

/// Ask the pipeline to run a network time sync
pub static SYNC_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Ask the pipeline to fetch fresh weather
pub static WEATHER_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Weather replies from the pipeline
pub static WEATHER_REPLY: Signal<CriticalSectionRawMutex, WeatherReport> = Signal::new();

/// Tool calls from the voice pipeline (memo edits, page switches)
pub static TOOL_REQUESTS: Channel<CriticalSectionRawMutex, ToolRequest, TOOL_CHANNEL_SIZE> =
    Channel::new();

/// Chime cues for the pipeline's speaker
pub static SOUND_CUES: Channel<CriticalSectionRawMutex, SoundCue, SOUND_CHANNEL_SIZE> =
    Channel::new();

/// Short acknowledgement lines sent back over the link
pub static TOOL_REPLIES: Channel<CriticalSectionRawMutex, heapless::String<96>, TOOL_CHANNEL_SIZE> =
    Channel::new();

/// Panel contrast level requested over the link
pub static CONTRAST: Signal<CriticalSectionRawMutex, u8> = Signal::new();

/// Wake the render task immediately instead of at its next tick
pub static RENDER_WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();
