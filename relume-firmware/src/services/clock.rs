//! System clock on top of the embassy monotonic
//!
//! Wall-clock time is an epoch anchored to a boot-relative instant;
//! setting the clock just moves the anchor. A network sync is a
//! request to the assistant link; the synced epoch comes back through
//! [`SYNCED_EPOCH`](crate::channels::SYNCED_EPOCH) and the update task
//! applies it before the clock is read again.

use embassy_time::Instant;

use relume_core::traits::TimeService;

use crate::channels::SYNC_REQUEST;

pub struct SystemClock {
    base_epoch: i64,
    base: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            base_epoch: 0,
            base: Instant::now(),
        }
    }
}

impl TimeService for SystemClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }

    fn now_epoch(&self) -> i64 {
        let elapsed = Instant::now().duration_since(self.base).as_secs() as i64;
        self.base_epoch + elapsed
    }

    fn set_epoch(&mut self, epoch: i64) {
        self.base_epoch = epoch;
        self.base = Instant::now();
    }

    fn sync_network_time(&mut self) {
        SYNC_REQUEST.signal(());
    }
}
