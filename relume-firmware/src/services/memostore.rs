//! Key-value persistence in a reserved flash region
//!
//! A small fixed slot table stands in for a full filesystem: each
//! known (namespace, key) pair owns one 4 KiB slot in the data
//! partition, written as a magic + length header followed by the
//! payload. Unknown pairs and torn headers read back as absent.

use core::cell::RefCell;

use embedded_storage::{ReadStorage, Storage};
use esp_storage::FlashStorage;
use log::warn;

use relume_core::traits::KvStore;

/// Start of the reserved data partition
const REGION_BASE: u32 = 0x0031_0000;
const SLOT_SIZE: u32 = 4096;
const MAGIC: [u8; 4] = *b"RLM1";
const HEADER_LEN: usize = 8;
/// Largest stored value; the memo list JSON is the biggest user
const VALUE_MAX: usize = 2048;

/// Storage namespace for persisted UI settings
pub const UI_NAMESPACE: &str = "ui";
/// Storage key for the panel contrast level
pub const CONTRAST_KEY: &str = "contrast";

/// Known slots, in partition order
const SLOTS: &[(&str, &str)] = &[
    (relume_core::memo::MEMO_NAMESPACE, relume_core::memo::MEMO_KEY),
    (UI_NAMESPACE, CONTRAST_KEY),
];

fn slot_offset(namespace: &str, key: &str) -> Option<u32> {
    SLOTS
        .iter()
        .position(|&(ns, k)| ns == namespace && k == key)
        .map(|i| REGION_BASE + i as u32 * SLOT_SIZE)
}

pub struct FlashKv {
    flash: RefCell<FlashStorage>,
}

impl FlashKv {
    pub fn new(flash: FlashStorage) -> Self {
        Self {
            flash: RefCell::new(flash),
        }
    }
}

impl KvStore for FlashKv {
    fn get(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Option<usize> {
        let offset = slot_offset(namespace, key)?;
        let mut flash = self.flash.borrow_mut();

        let mut header = [0u8; HEADER_LEN];
        if flash.read(offset, &mut header).is_err() {
            warn!("kv: read failed at {:#x}", offset);
            return None;
        }
        if header[0..4] != MAGIC {
            return None;
        }

        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        if len > VALUE_MAX || len > buf.len() {
            warn!("kv: implausible length {} for {}/{}", len, namespace, key);
            return None;
        }

        if flash.read(offset + HEADER_LEN as u32, &mut buf[..len]).is_err() {
            warn!("kv: read failed at {:#x}", offset);
            return None;
        }
        Some(len)
    }

    fn set(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(), ()> {
        let offset = slot_offset(namespace, key).ok_or(())?;
        if value.len() > VALUE_MAX {
            return Err(());
        }
        let mut flash = self.flash.borrow_mut();

        // One write call keeps it to a single sector erase cycle
        let mut record = [0u8; HEADER_LEN + VALUE_MAX];
        record[0..4].copy_from_slice(&MAGIC);
        record[4..8].copy_from_slice(&(value.len() as u32).to_le_bytes());
        record[HEADER_LEN..HEADER_LEN + value.len()].copy_from_slice(value);

        flash
            .write(offset, &record[..HEADER_LEN + value.len()])
            .map_err(|_| ())
    }

    fn erase(&self, namespace: &str, key: &str) -> Result<(), ()> {
        let offset = slot_offset(namespace, key).ok_or(())?;
        let mut flash = self.flash.borrow_mut();
        flash.write(offset, &[0u8; HEADER_LEN]).map_err(|_| ())
    }
}
