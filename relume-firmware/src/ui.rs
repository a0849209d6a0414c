//! Shared retained scene behind the display lock
//!
//! Every task that draws goes through [`SharedScene`]. The scene lives
//! in a blocking mutex so writers stay synchronous; only the render
//! task talks to the panel, and it copies nothing - it renders straight
//! from the scene under the same lock, then flushes over SPI outside
//! of it.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicU32, Ordering};

use relume_core::traits::{AlertSink, DisplaySurface, SharedSurface, SoundCue};
use relume_display::Scene;

use crate::channels::{RENDER_WAKE, SOUND_CUES};

/// Full-screen alerts dismiss themselves after this long
pub const OVERLAY_TIMEOUT_MS: u32 = 30_000;

/// Scene plus the overlay gate that keeps routine refreshes from
/// painting over an active alert
pub struct SharedScene {
    scene: Mutex<CriticalSectionRawMutex, RefCell<Scene>>,
    /// Overlay expiry in boot-relative ms; 0 means no overlay
    overlay_until: AtomicU32,
}

impl SharedScene {
    pub fn new() -> Self {
        Self {
            scene: Mutex::new(RefCell::new(Scene::new())),
            overlay_until: AtomicU32::new(0),
        }
    }

    pub fn overlay_active(&self, now_ms: u32) -> bool {
        let until = self.overlay_until.load(Ordering::Acquire);
        until != 0 && now_ms < until
    }

    /// Drop an overlay whose deadline passed; `true` when one was cleared
    pub fn expire_overlay(&self, now_ms: u32) -> bool {
        let until = self.overlay_until.load(Ordering::Acquire);
        if until == 0 || now_ms < until {
            return false;
        }
        self.overlay_until.store(0, Ordering::Release);
        self.scene.lock(|cell| cell.borrow_mut().clear_alert());
        true
    }

    /// Dismiss the overlay early, e.g. on a button press
    pub fn dismiss_overlay(&self) -> bool {
        if self.overlay_until.swap(0, Ordering::AcqRel) == 0 {
            return false;
        }
        self.scene.lock(|cell| cell.borrow_mut().clear_alert());
        true
    }

    pub fn show_alert(&self, title: &str, body: &str, now_ms: u32) {
        self.scene
            .lock(|cell| cell.borrow_mut().show_alert(title, body));
        // now + timeout can be 0 only on wraparound; saturate past it
        let until = now_ms.wrapping_add(OVERLAY_TIMEOUT_MS).max(1);
        self.overlay_until.store(until, Ordering::Release);
        RENDER_WAKE.signal(());
    }

    /// Borrow the scene for drawing or render-state queries
    pub fn lock<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> R {
        self.scene.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl SharedSurface for SharedScene {
    fn try_with(&self, now_ms: u32, f: &mut dyn FnMut(&mut dyn DisplaySurface)) -> bool {
        if self.overlay_active(now_ms) {
            return false;
        }
        self.scene.lock(|cell| f(&mut *cell.borrow_mut()));
        true
    }

    fn with(&self, f: &mut dyn FnMut(&mut dyn DisplaySurface)) {
        self.scene.lock(|cell| f(&mut *cell.borrow_mut()));
    }
}

/// Alerts raised from the update task: popup, chime, render kick
pub struct Alerts<'a> {
    pub scene: &'a SharedScene,
    pub now_ms: u32,
}

impl AlertSink for Alerts<'_> {
    fn alert(&mut self, title: &str, body: &str) {
        self.scene.show_alert(title, body, self.now_ms);
    }

    fn play_sound(&mut self, cue: SoundCue) {
        // A full channel drops the cue rather than blocking the poller
        let _ = SOUND_CUES.try_send(cue);
    }
}
