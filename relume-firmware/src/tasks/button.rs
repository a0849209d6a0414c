//! Front button task
//!
//! One button does three jobs: wake the panel out of power saving,
//! dismiss an active alert, and cycle the side card page. Dismissal
//! wins over page cycling so an alert press never also flips the card.

use embassy_time::{Duration, Timer};
use esp_hal::gpio::Input;
use log::{debug, info};

use relume_display::Page;

use crate::channels::{ACTIVITY, RENDER_WAKE};
use crate::ui::SharedScene;

const DEBOUNCE_MS: u64 = 50;

fn next_page(page: Page) -> Page {
    match page {
        Page::Weather => Page::Music,
        Page::Music => Page::Pomodoro,
        Page::Pomodoro => Page::Weather,
    }
}

#[embassy_executor::task]
pub async fn button_task(ui: &'static SharedScene, mut button: Input<'static>) {
    info!("button task started");

    loop {
        button.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
        if button.is_high() {
            continue;
        }

        ACTIVITY.signal(());

        if ui.dismiss_overlay() {
            debug!("button: alert dismissed");
        } else {
            ui.lock(|scene| {
                let page = next_page(scene.page());
                scene.set_page(page);
            });
        }
        RENDER_WAKE.signal(());

        button.wait_for_rising_edge().await;
    }
}
