//! Render task: sole owner of the panel
//!
//! Ticks at animation rate, repaints the scene into the panel's frame
//! buffer whenever it is dirty or a scroll is running, and pushes the
//! buffer over SPI. Writers never wait on the SPI transfer; they mark
//! the scene and go.

use embassy_futures::select::select;
use embassy_time::{Duration, Instant, Ticker};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::delay::Delay;
use esp_hal::gpio::Output;
use esp_hal::spi::master::Spi;
use esp_hal::Blocking;
use log::{info, warn};

use relume_display::{PanelDriver, SpiInterface};

use crate::channels::{CONTRAST, RENDER_WAKE};
use crate::ui::SharedScene;

/// Scroll animation frame period
const FRAME_MS: u64 = 100;

pub type PanelSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, Delay>;
pub type PanelIface = SpiInterface<PanelSpi, Output<'static>, Output<'static>>;

#[embassy_executor::task]
pub async fn render_task(ui: &'static SharedScene, mut panel: PanelDriver<PanelIface>) {
    info!("render task started");

    let mut ticker = Ticker::every(Duration::from_millis(FRAME_MS));

    loop {
        select(ticker.next(), RENDER_WAKE.wait()).await;
        let now = Instant::now().as_millis() as u32;

        ui.expire_overlay(now);

        if let Some(level) = CONTRAST.try_take() {
            if panel.set_contrast(level).is_err() {
                warn!("contrast write failed");
            }
        }

        let painted = ui.lock(|scene| {
            let dirty = scene.take_dirty();
            if dirty || scene.animating(now) {
                // Rendering into the frame buffer cannot fail
                let _ = scene.render(&mut panel, now);
                true
            } else {
                false
            }
        });

        if painted {
            if let Err(e) = panel.flush() {
                warn!("panel flush failed: {}", e);
            }
        }
    }
}
