//! Update task: the per-second poll loop
//!
//! Owns the system clock, the poller and every sensor service, and
//! runs one poll pass per wake-up. The sleep between passes comes from
//! the poller (longer in power saving, shorter while a sync retry is
//! backing off); a button press cuts the sleep short so the display
//! reacts immediately.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use esp_hal::delay::Delay;
use esp_hal::gpio::Input;
use esp_storage::FlashStorage;
use log::info;

use relume_core::memo::MemoPad;
use relume_core::poller::{Services, UpdatePoller};
use relume_core::state::DeviceState;
use relume_core::traits::{DeviceStateSource, DisplaySurface, SharedSurface, TimeService};

use crate::channels::{self, ACTIVITY, RENDER_WAKE, SYNCED_EPOCH};
use crate::drivers::battery::{AdcSampler, BatterySense};
use crate::drivers::pcf85063::Pcf85063;
use crate::drivers::shtc3::Shtc3;
use crate::drivers::BusDevice;
use crate::services::clock::SystemClock;
use crate::services::memostore::FlashKv;
use crate::services::tools;
use crate::services::weather::LinkWeather;
use crate::ui::{Alerts, SharedScene};

/// Local timezone offset; the panel shows wall-clock time
const UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Pipeline state as published by the link task
struct LinkState;

impl DeviceStateSource for LinkState {
    fn current(&self) -> DeviceState {
        channels::current_state()
    }
}

#[embassy_executor::task]
pub async fn update_task(
    ui: &'static SharedScene,
    mut rtc: Pcf85063<BusDevice>,
    mut env: Shtc3<BusDevice, Delay>,
    mut battery: BatterySense<AdcSampler, Input<'static>, Input<'static>>,
) {
    info!("update task started");

    let mut time = SystemClock::new();
    let mut poller = UpdatePoller::new(time.now_ms(), UTC_OFFSET_SECS);
    poller.bootstrap(&mut time, &mut rtc);

    let mut weather = LinkWeather::new();
    let mut memos = MemoPad::load(FlashKv::new(FlashStorage::new()));
    info!("loaded {} reminders", memos.list().len());

    // First paint of whatever survived the reboot
    {
        let list = memos.list();
        ui.with(&mut |surface: &mut dyn DisplaySurface| {
            surface.refresh_memos(list);
        });
    }

    let state = LinkState;

    loop {
        if let Some(epoch) = SYNCED_EPOCH.try_take() {
            info!("applying synced epoch {}", epoch);
            time.set_epoch(epoch);
        }
        if ACTIVITY.try_take().is_some() {
            poller.note_activity(time.now_ms());
        }
        if tools::drain(ui, &mut memos) {
            poller.note_activity(time.now_ms());
        }

        let sleep_ms = {
            let mut alerts = Alerts {
                scene: ui,
                now_ms: time.now_ms(),
            };
            let mut svc = Services {
                time: &mut time,
                rtc: &mut rtc,
                weather: &mut weather,
                env: &mut env,
                battery: &mut battery,
                alerts: &mut alerts,
                state: &state,
                memos: &mut memos,
            };
            poller.poll(&mut svc, ui)
        };
        RENDER_WAKE.signal(());

        match select(
            Timer::after(Duration::from_millis(sleep_ms as u64)),
            ACTIVITY.wait(),
        )
        .await
        {
            Either::First(()) => {}
            Either::Second(()) => poller.note_activity(time.now_ms()),
        }
    }
}
