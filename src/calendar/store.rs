use log::{debug, error, warn};
use serde::Deserialize;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use super::event::{Event, EventDetails};
use super::storage::StorageAdapter;

/// What to do when the stored list cannot be parsed at start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryPolicy {
    /// Refuse to open the store.
    #[default]
    Fail,
    /// Start empty. The corrupt value is overwritten by the next save.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&[Event])>;

/// Authoritative in-memory event list, written through to storage on every
/// change.
///
/// A failed save does not roll back the in-memory change: the error is
/// returned and memory stays ahead of storage until the next successful
/// save.
pub struct EventStore {
    events: Vec<Event>,
    storage: StorageAdapter,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl EventStore {
    /// Loads the persisted list, failing if it is malformed.
    pub fn open(storage: StorageAdapter) -> StorageResult<Self> {
        Self::open_with(storage, RecoveryPolicy::Fail)
    }

    pub fn open_with(storage: StorageAdapter, policy: RecoveryPolicy) -> StorageResult<Self> {
        let events = match storage.load() {
            Ok(events) => events,
            Err(err @ StorageError::Malformed { .. }) if policy == RecoveryPolicy::Reset => {
                warn!("{err}; starting with an empty calendar");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            events,
            storage,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Events in insertion order.
    pub fn list(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Appends a new event under a fresh id and returns that id.
    ///
    /// On a save error the event is still the last one in [`list`](Self::list).
    pub fn add(&mut self, details: EventDetails) -> StorageResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!("Adding event {id} ({})", details.name);
        self.events.push(Event::new(id.clone(), details));
        self.commit()?;
        Ok(id)
    }

    /// Replaces the details of event `id`, keeping its position. Unknown ids
    /// leave the list as is.
    pub fn update(&mut self, id: &str, details: EventDetails) -> StorageResult<()> {
        match self.events.iter_mut().find(|e| e.id == id) {
            Some(event) => {
                debug!("Updating event {id}");
                event.details = details;
            }
            None => debug!("Update of unknown event {id} ignored"),
        }
        self.commit()
    }

    /// Removes event `id` if present.
    pub fn delete(&mut self, id: &str) -> StorageResult<()> {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() < before {
            debug!("Deleted event {id}");
        }
        self.commit()
    }

    /// Calls `listener` with the full list after every mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&[Event]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        let listener: Listener = Box::new(listener);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() < before
    }

    fn commit(&mut self) -> StorageResult<()> {
        let saved = self.storage.save(&self.events);
        if let Err(ref e) = saved {
            error!("Failed to persist events: {e}");
        }
        for (_, listener) in &mut self.listeners {
            listener(&self.events);
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::calendar::event::{EventColor, Schedule};
    use crate::calendar::storage::{MemoryStore, DEFAULT_KEY};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn standup() -> EventDetails {
        EventDetails::timed(
            "Standup",
            EventColor::Blue,
            date(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
        )
    }

    fn detail(name: &str) -> EventDetails {
        EventDetails::all_day(name, EventColor::Green, date())
    }

    fn open(mem: &MemoryStore) -> EventStore {
        EventStore::open(StorageAdapter::new(mem.clone())).unwrap()
    }

    fn seeded(mem: &MemoryStore, names: &[&str]) -> (EventStore, Vec<String>) {
        let mut store = open(mem);
        let ids = names
            .iter()
            .map(|n| store.add(detail(n)).unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn starts_empty_without_stored_value() {
        let store = open(&MemoryStore::new());
        assert!(store.list().is_empty());
    }

    #[test]
    fn add_appends_with_unique_id() {
        let mem = MemoryStore::new();
        let (mut store, _) = seeded(&mem, &["a", "b"]);

        let id = store.add(standup()).unwrap();

        assert_eq!(store.list().len(), 3);
        let last = store.list().last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.details, standup());
        assert!(!id.is_empty());

        let ids: HashSet<_> = store.list().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn add_persists() {
        let mem = MemoryStore::new();
        let mut store = open(&mem);
        let id = store.add(standup()).unwrap();

        let reopened = open(&mem);
        assert_eq!(reopened.list().len(), 1);
        assert_eq!(reopened.list()[0].id, id);
        assert_eq!(reopened.list()[0].details, standup());
    }

    #[test]
    fn update_replaces_in_place() {
        let mem = MemoryStore::new();
        let (mut store, ids) = seeded(&mem, &["a", "b", "c"]);
        let before = store.list().to_vec();

        store.update(&ids[1], standup()).unwrap();

        let after = store.list();
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], Event::new(ids[1].clone(), standup()));
        assert_eq!(after[2], before[2]);
    }

    #[test]
    fn update_to_all_day_drops_times() {
        let mem = MemoryStore::new();
        let mut store = open(&mem);
        let id = store.add(standup()).unwrap();

        let moved = EventDetails::all_day("Standup (moved)", EventColor::Blue, date());
        store.update(&id, moved).unwrap();

        let event = store.get(&id).unwrap();
        assert_eq!(event.details.schedule, Schedule::AllDay);
        assert_eq!(event.details.name, "Standup (moved)");

        let raw = mem.raw(DEFAULT_KEY).unwrap();
        assert!(!raw.contains("startTime"));
        assert!(!raw.contains("endTime"));
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mem = MemoryStore::new();
        let (mut store, _) = seeded(&mem, &["a", "b"]);
        let before = store.list().to_vec();

        store.update("missing", standup()).unwrap();
        assert_eq!(store.list(), &before[..]);
    }

    #[test]
    fn delete_removes_event() {
        let mem = MemoryStore::new();
        let (mut store, ids) = seeded(&mem, &["a", "b", "c"]);

        store.delete(&ids[0]).unwrap();

        assert_eq!(store.list().len(), 2);
        assert!(store.list().iter().all(|e| e.id != ids[0]));
        assert_eq!(open(&mem).list().len(), 2);
    }

    #[test]
    fn delete_twice_is_noop_the_second_time() {
        let mem = MemoryStore::new();
        let (mut store, ids) = seeded(&mem, &["a", "b"]);

        store.delete(&ids[0]).unwrap();
        let after_first = store.list().to_vec();
        store.delete(&ids[0]).unwrap();

        assert_eq!(store.list(), &after_first[..]);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn delete_unknown_id_is_noop() {
        let mem = MemoryStore::new();
        let (mut store, _) = seeded(&mem, &["a"]);
        store.delete("missing").unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn failed_save_keeps_memory_change() {
        let mem = MemoryStore::new();
        let (mut store, _) = seeded(&mem, &["a"]);
        mem.set_quota(Some(1));

        let saved = store.add(detail("b"));
        assert!(matches!(saved, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.list()[1].details.name, "b");
        assert_eq!(open(&mem).list().len(), 1);

        mem.set_quota(None);
        store.delete("missing").unwrap();
        assert_eq!(open(&mem).list().len(), 2);
    }

    #[test]
    fn subscribers_see_every_mutation() {
        let mem = MemoryStore::new();
        let mut store = open(&mem);
        let calls = Rc::new(Cell::new(0));
        let last_len = Rc::new(Cell::new(0));

        let sub = {
            let calls = calls.clone();
            let last_len = last_len.clone();
            store.subscribe(move |events| {
                calls.set(calls.get() + 1);
                last_len.set(events.len());
            })
        };

        let id = store.add(standup()).unwrap();
        store.update(&id, detail("x")).unwrap();
        store.delete(&id).unwrap();
        assert_eq!(calls.get(), 3);
        assert_eq!(last_len.get(), 0);

        assert!(store.unsubscribe(sub));
        store.add(standup()).unwrap();
        assert_eq!(calls.get(), 3);
        assert!(!store.unsubscribe(sub));
    }

    #[test]
    fn malformed_storage_fails_by_default() {
        let mem = MemoryStore::new();
        mem.put_raw(DEFAULT_KEY, "not json");
        let result = EventStore::open(StorageAdapter::new(mem));
        assert!(matches!(result, Err(StorageError::Malformed { .. })));
    }

    #[test]
    fn malformed_storage_resets_when_asked() {
        let mem = MemoryStore::new();
        mem.put_raw(DEFAULT_KEY, "not json");

        let mut store =
            EventStore::open_with(StorageAdapter::new(mem.clone()), RecoveryPolicy::Reset).unwrap();
        assert!(store.list().is_empty());
        assert_eq!(mem.raw(DEFAULT_KEY).as_deref(), Some("not json"));

        store.add(standup()).unwrap();
        assert_eq!(open(&mem).list().len(), 1);
    }
}
