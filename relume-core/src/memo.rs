//! Reminder list, persistence format and alarm matching
//!
//! Reminders are voice-created notes, optionally labelled with an
//! `HH:MM` alarm time. The whole list is stored as one JSON array under
//! a single key-value entry so the storage layer stays a dumb byte
//! store. Alarm matching runs once per minute against the current
//! civil time and fires each reminder at most once by removing it.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::traits::KvStore;

/// Storage namespace for the reminder list
pub const MEMO_NAMESPACE: &str = "memo";
/// Storage key holding the JSON array
pub const MEMO_KEY: &str = "items";
/// Reminder list capacity
pub const MAX_MEMOS: usize = 10;
/// Serialized list size bound
pub const MEMO_JSON_MAX: usize = 2_048;

/// One reminder; short serde names keep the stored JSON compact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Alarm label, `"HH:MM"` or free text such as `"today"`
    #[serde(rename = "t")]
    pub time: String<8>,
    /// Reminder body
    #[serde(rename = "c")]
    pub text: String<48>,
}

/// Errors surfaced to the voice-tool layer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoError {
    /// The list already holds [`MAX_MEMOS`] entries
    ListFull,
    /// 1-based index outside the current list
    BadIndex { count: usize },
    /// Operation needs at least one reminder
    Empty,
    /// Serialization failed or did not fit the buffer
    Encode,
    /// Backing store rejected the write
    Storage,
}

/// In-memory reminder list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoList {
    items: Vec<Reminder, MAX_MEMOS>,
}

impl MemoList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored list; malformed or oversized input yields an empty
    /// list rather than an error, so corrupt flash never bricks reminders
    pub fn from_json(bytes: &[u8]) -> Self {
        match serde_json_core::from_slice::<Vec<Reminder, MAX_MEMOS>>(bytes) {
            Ok((items, _)) => Self { items },
            Err(_) => Self::new(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8, MEMO_JSON_MAX>, MemoError> {
        let mut buf: Vec<u8, MEMO_JSON_MAX> = Vec::new();
        // serde-json-core needs the buffer pre-sized
        buf.resize_default(MEMO_JSON_MAX).map_err(|_| MemoError::Encode)?;
        let used = serde_json_core::to_slice(&self.items, &mut buf).map_err(|_| MemoError::Encode)?;
        buf.truncate(used);
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reminder> {
        self.items.iter()
    }

    pub fn add(&mut self, reminder: Reminder) -> Result<(), MemoError> {
        self.items.push(reminder).map_err(|_| MemoError::ListFull)
    }

    /// Remove by the 1-based index shown on screen
    pub fn complete(&mut self, index: usize) -> Result<Reminder, MemoError> {
        if self.items.is_empty() {
            return Err(MemoError::Empty);
        }
        if index == 0 || index > self.items.len() {
            return Err(MemoError::BadIndex {
                count: self.items.len(),
            });
        }
        Ok(self.items.remove(index - 1))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove every reminder whose label equals `hhmm` and report them
    ///
    /// Scans back-to-front so removal never skips an entry. Returns the
    /// fired reminders in list order.
    pub fn scan_alarms(&mut self, hhmm: &str) -> Vec<Reminder, MAX_MEMOS> {
        let mut fired: Vec<Reminder, MAX_MEMOS> = Vec::new();
        for i in (0..self.items.len()).rev() {
            if is_alarm_label(self.items[i].time.as_str()) && self.items[i].time.as_str() == hhmm {
                // Capacity matches, push cannot fail
                let _ = fired.push(self.items.remove(i));
            }
        }
        fired.reverse();
        fired
    }
}

/// Whether a reminder label is a well-formed 24h `HH:MM` alarm time
///
/// Free-text labels like `"today"` or `"soon"` are valid reminders but
/// never fire as alarms.
pub fn is_alarm_label(label: &str) -> bool {
    let b = label.as_bytes();
    if b.len() != 5 || b[2] != b':' {
        return false;
    }
    if ![b[0], b[1], b[3], b[4]].iter().all(u8::is_ascii_digit) {
        return false;
    }
    let hour = (b[0] - b'0') * 10 + (b[1] - b'0');
    let minute = (b[3] - b'0') * 10 + (b[4] - b'0');
    hour <= 23 && minute <= 59
}

/// Reminder list bound to its backing store
pub struct MemoPad<S: KvStore> {
    store: S,
    list: MemoList,
}

impl<S: KvStore> MemoPad<S> {
    /// Load the persisted list; a missing key starts empty
    pub fn load(store: S) -> Self {
        let mut buf = [0u8; MEMO_JSON_MAX];
        let list = match store.get(MEMO_NAMESPACE, MEMO_KEY, &mut buf) {
            Some(len) => MemoList::from_json(&buf[..len]),
            None => MemoList::new(),
        };
        Self { store, list }
    }

    pub fn list(&self) -> &MemoList {
        &self.list
    }

    /// The backing store, for other keys sharing it
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct mutable access for callers that decide afterwards whether
    /// anything changed and is worth a [`save`](Self::save)
    pub fn list_mut(&mut self) -> &mut MemoList {
        &mut self.list
    }

    /// Mutate the list and persist the result in one step
    pub fn mutate<R>(
        &mut self,
        f: impl FnOnce(&mut MemoList) -> Result<R, MemoError>,
    ) -> Result<R, MemoError> {
        let out = f(&mut self.list)?;
        self.save()?;
        Ok(out)
    }

    pub fn save(&mut self) -> Result<(), MemoError> {
        let json = self.list.to_json()?;
        self.store
            .set(MEMO_NAMESPACE, MEMO_KEY, &json)
            .map_err(|_| MemoError::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder(time: &str, text: &str) -> Reminder {
        Reminder {
            time: String::try_from(time).unwrap(),
            text: String::try_from(text).unwrap(),
        }
    }

    #[test]
    fn alarm_label_validation() {
        assert!(is_alarm_label("00:00"));
        assert!(is_alarm_label("23:59"));
        assert!(is_alarm_label("07:05"));
        assert!(!is_alarm_label("24:00"));
        assert!(!is_alarm_label("12:60"));
        assert!(!is_alarm_label("7:05"));
        assert!(!is_alarm_label("12-30"));
        assert!(!is_alarm_label("ab:cd"));
        assert!(!is_alarm_label("today"));
        assert!(!is_alarm_label(""));
    }

    #[test]
    fn list_full_rejected() {
        let mut list = MemoList::new();
        for i in 0..MAX_MEMOS {
            assert!(list.add(reminder("today", core::str::from_utf8(&[b'a' + i as u8]).unwrap())).is_ok());
        }
        assert_eq!(list.add(reminder("today", "overflow")), Err(MemoError::ListFull));
        assert_eq!(list.len(), MAX_MEMOS);
    }

    #[test]
    fn complete_uses_one_based_index() {
        let mut list = MemoList::new();
        list.add(reminder("08:00", "first")).unwrap();
        list.add(reminder("09:00", "second")).unwrap();
        let removed = list.complete(1).unwrap();
        assert_eq!(removed.text.as_str(), "first");
        assert_eq!(list.complete(0), Err(MemoError::BadIndex { count: 1 }));
        assert_eq!(list.complete(2), Err(MemoError::BadIndex { count: 1 }));
        list.complete(1).unwrap();
        assert_eq!(list.complete(1), Err(MemoError::Empty));
    }

    #[test]
    fn scan_fires_matching_alarms_once() {
        let mut list = MemoList::new();
        list.add(reminder("08:30", "standup")).unwrap();
        list.add(reminder("today", "water plants")).unwrap();
        list.add(reminder("08:30", "coffee")).unwrap();
        list.add(reminder("21:00", "wind down")).unwrap();

        let fired = list.scan_alarms("08:30");
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].text.as_str(), "standup");
        assert_eq!(fired[1].text.as_str(), "coffee");
        // Fired entries are gone; a second scan in the same minute is a no-op
        assert_eq!(list.len(), 2);
        assert!(list.scan_alarms("08:30").is_empty());
    }

    #[test]
    fn free_text_labels_never_fire() {
        let mut list = MemoList::new();
        list.add(reminder("today", "today")).unwrap();
        assert!(list.scan_alarms("today").is_empty());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn json_round_trip() {
        let mut list = MemoList::new();
        list.add(reminder("08:30", "standup")).unwrap();
        list.add(reminder("today", "water plants")).unwrap();
        let json = list.to_json().unwrap();
        assert_eq!(MemoList::from_json(&json), list);
    }

    #[test]
    fn json_uses_short_field_names() {
        let mut list = MemoList::new();
        list.add(reminder("08:30", "x")).unwrap();
        let json = list.to_json().unwrap();
        let text = core::str::from_utf8(&json).unwrap();
        assert_eq!(text, r#"[{"t":"08:30","c":"x"}]"#);
    }

    #[test]
    fn malformed_json_yields_empty_list() {
        assert!(MemoList::from_json(b"{not json").is_empty());
        assert!(MemoList::from_json(b"").is_empty());
        // Wrong shape, valid JSON
        assert!(MemoList::from_json(b"{\"t\":1}").is_empty());
    }

    struct FakeStore {
        value: core::cell::RefCell<Option<Vec<u8, MEMO_JSON_MAX>>>,
    }

    impl KvStore for &FakeStore {
        fn get(&self, _ns: &str, _key: &str, buf: &mut [u8]) -> Option<usize> {
            let v = self.value.borrow();
            let v = v.as_ref()?;
            buf[..v.len()].copy_from_slice(v);
            Some(v.len())
        }

        fn set(&self, _ns: &str, _key: &str, value: &[u8]) -> Result<(), ()> {
            let mut stored = Vec::new();
            stored.extend_from_slice(value)?;
            *self.value.borrow_mut() = Some(stored);
            Ok(())
        }

        fn erase(&self, _ns: &str, _key: &str) -> Result<(), ()> {
            *self.value.borrow_mut() = None;
            Ok(())
        }
    }

    #[test]
    fn pad_persists_mutations() {
        let store = FakeStore {
            value: core::cell::RefCell::new(None),
        };
        let mut pad = MemoPad::load(&store);
        assert!(pad.list().is_empty());
        pad.mutate(|l| l.add(reminder("08:30", "standup"))).unwrap();

        let reloaded = MemoPad::load(&store);
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.list().iter().next().unwrap().text.as_str(), "standup");
    }

    #[test]
    fn pad_exposes_store_for_other_keys() {
        let store = FakeStore {
            value: core::cell::RefCell::new(None),
        };
        let pad = MemoPad::load(&store);
        pad.store().set("ui", "contrast", &[7]).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(pad.store().get("ui", "contrast", &mut buf), Some(1));
        assert_eq!(buf[0], 7);
    }

    #[test]
    fn pad_survives_corrupt_store() {
        let store = FakeStore {
            value: core::cell::RefCell::new(None),
        };
        store.value.borrow_mut().replace({
            let mut v = Vec::new();
            v.extend_from_slice(b"\xff\xfe garbage").unwrap();
            v
        });
        let pad = MemoPad::load(&store);
        assert!(pad.list().is_empty());
    }
}
