use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::live::{Subscription, SubscriptionId};
use super::{KeyValueStore, LiveQuery};
use crate::models::{new_note_id, now_millis, Note};
use crate::query::{Filter, Query};
use crate::schema::validate_note;
use crate::{Error, Result};

/// Storage key the collection is persisted under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "my notes";

/// Source of "now" for timestamps
pub trait Clock {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

impl<F: Fn() -> i64> Clock for F {
    fn now_millis(&self) -> i64 {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Storage has not been read yet
    Idle,
    Ready,
}

/// Derived counters over the whole collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub favorites: usize,
}

/// Persisted, keyed collection of notes with live queries.
///
/// The whole collection is stored as one JSON object (id -> note) under a single
/// storage key. Every committed mutation rewrites that entry and then re-evaluates
/// each subscription on the calling thread.
pub struct NoteStore<S: KeyValueStore> {
    storage: S,
    storage_key: String,
    notes: BTreeMap<String, Note>,
    /// Stored records that failed validation, written back verbatim on every commit
    skipped: Map<String, Value>,
    status: CollectionStatus,
    clock: Box<dyn Clock>,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
}

impl<S: KeyValueStore> NoteStore<S> {
    /// Create a store over `storage` without reading it yet
    pub fn new(storage: S, storage_key: impl Into<String>) -> Self {
        Self {
            storage,
            storage_key: storage_key.into(),
            notes: BTreeMap::new(),
            skipped: Map::new(),
            status: CollectionStatus::Idle,
            clock: Box::new(SystemClock),
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create a store and load it immediately
    pub fn open(storage: S, storage_key: impl Into<String>) -> Result<Self> {
        let mut store = Self::new(storage, storage_key);
        store.load()?;
        Ok(store)
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn status(&self) -> CollectionStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == CollectionStatus::Ready
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the collection from storage and resolve every subscription.
    ///
    /// A missing entry is an empty collection. Records that no longer pass
    /// validation are skipped but kept in storage; a payload that is not a JSON
    /// object is an error and leaves the store idle. Records that validate only
    /// after defaults were filled in are written back in their normalized form.
    pub fn load(&mut self) -> Result<()> {
        let raw = self
            .storage
            .get_item(&self.storage_key)
            .map_err(|e| storage_error("read", e))?;

        let mut notes = BTreeMap::new();
        let mut skipped = Map::new();
        let mut normalized = 0;
        if let Some(raw) = raw {
            let records: Map<String, Value> = serde_json::from_str(&raw)?;
            let now = self.clock.now_millis();
            for (key, record) in records {
                match validate_note(&record, now) {
                    Ok(note) if note.id == key => {
                        if serde_json::to_value(&note).map_or(true, |value| value != record) {
                            normalized += 1;
                        }
                        notes.insert(key, note);
                    }
                    Ok(note) => {
                        warn!(key = %key, id = %note.id, "Skipping note stored under a mismatched key");
                        skipped.insert(key, record);
                    }
                    Err(errors) => {
                        warn!(key = %key, %errors, "Skipping invalid stored note");
                        skipped.insert(key, record);
                    }
                }
            }
        }

        info!(
            key = %self.storage_key,
            count = notes.len(),
            skipped = skipped.len(),
            "Loaded note collection"
        );
        self.notes = notes;
        self.skipped = skipped;
        self.status = CollectionStatus::Ready;

        if normalized > 0 {
            debug!(count = normalized, "Writing back normalized notes");
            if let Err(err) = self.persist() {
                warn!(error = %err, "Normalized notes were not written back");
            }
        }

        self.notify();
        Ok(())
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.status == CollectionStatus::Idle {
            self.load()?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notes.contains_key(id)
    }

    /// All notes in id order
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Stored records that could not be read on the last load
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn favorite_count(&self) -> usize {
        self.notes.values().filter(|n| n.is_favorite).count()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total: self.len(),
            favorites: self.favorite_count(),
        }
    }

    /// One-shot evaluation of `query`
    pub fn query(&self, query: &Query) -> Vec<Note> {
        query.evaluate(self.notes.values())
    }

    pub fn find(&self, id: &str) -> Vec<Note> {
        self.query(&Query::all().filter(Filter::IdEq(id.to_string())))
    }

    /// A fresh id not present in the collection
    pub fn generate_id(&self) -> String {
        loop {
            let id = new_note_id();
            if !self.is_taken(&id) {
                return id;
            }
        }
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    fn is_taken(&self, id: &str) -> bool {
        self.notes.contains_key(id) || self.skipped.contains_key(id)
    }

    /// Insert a validated note. Duplicate ids are rejected.
    pub fn insert(&mut self, note: Note) -> Result<()> {
        self.ensure_loaded()?;
        note.check()?;
        if self.is_taken(&note.id) {
            return Err(Error::DuplicateId(note.id));
        }

        let id = note.id.clone();
        self.notes.insert(id.clone(), note);
        if let Err(e) = self.persist() {
            self.notes.remove(&id);
            return Err(e);
        }

        debug!(id = %id, "Inserted note");
        self.notify();
        Ok(())
    }

    /// Apply `mutator` to a draft of the note and commit it.
    ///
    /// `updated_at` is always owned by the store: it is set to the current time,
    /// and never moves backwards or stays put. `id` and `created_at` must not change.
    pub fn update<F>(&mut self, id: &str, mutator: F) -> Result<Note>
    where
        F: FnOnce(&mut Note),
    {
        self.ensure_loaded()?;
        let current = self
            .notes
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Note not found: {}", id)))?;

        let mut draft = current.clone();
        mutator(&mut draft);
        if draft.id != current.id {
            return Err(Error::InvalidInput("Note id is immutable".to_string()));
        }
        if draft.created_at != current.created_at {
            return Err(Error::InvalidInput("Note created_at is immutable".to_string()));
        }
        draft.updated_at = current.updated_at;
        draft.touch(self.clock.now_millis())?;
        draft.check()?;

        self.notes.insert(draft.id.clone(), draft.clone());
        if let Err(e) = self.persist() {
            self.notes.insert(current.id.clone(), current);
            return Err(e);
        }

        debug!(id = %id, updated_at = draft.updated_at, "Updated note");
        self.notify();
        Ok(draft)
    }

    pub fn toggle_favorite(&mut self, id: &str) -> Result<Note> {
        self.update(id, |note| note.is_favorite = !note.is_favorite)
    }

    /// Remove a note by id. Unknown ids are reported as `NotFound`.
    pub fn delete(&mut self, id: &str) -> Result<Note> {
        self.ensure_loaded()?;
        let removed = self
            .notes
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Note not found: {}", id)))?;

        if let Err(e) = self.persist() {
            self.notes.insert(removed.id.clone(), removed);
            return Err(e);
        }

        debug!(id = %id, "Deleted note");
        self.notify();
        Ok(removed)
    }

    /// Register `callback` to receive the results of `query` after every commit.
    ///
    /// If the collection is already loaded the callback also runs once right away.
    pub fn subscribe<F>(&mut self, query: Query, callback: F) -> SubscriptionId
    where
        F: FnMut(&[Note]) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let mut subscription = Subscription {
            id,
            query,
            callback: Box::new(callback),
        };
        if self.is_ready() {
            subscription.deliver(self.notes.values());
        }
        self.subscriptions.push(subscription);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Subscribe with a handle that caches the latest results
    pub fn live_query(&mut self, query: Query) -> LiveQuery {
        let state = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&state);
        self.subscribe(query, move |notes| {
            *sink.borrow_mut() = Some(notes.to_vec());
        });
        LiveQuery::new(state)
    }

    fn persist(&mut self) -> Result<()> {
        let mut records = self.skipped.clone();
        for (id, note) in &self.notes {
            records.insert(id.clone(), serde_json::to_value(note)?);
        }
        let payload = serde_json::to_string(&records)?;
        self.storage
            .set_item(&self.storage_key, &payload)
            .map_err(|e| storage_error("write", e))
    }

    fn notify(&mut self) {
        let notes = &self.notes;
        for subscription in self.subscriptions.iter_mut() {
            subscription.deliver(notes.values());
        }
    }
}

fn storage_error(action: &str, err: Error) -> Error {
    warn!(error = %err, "Storage {} failed", action);
    match err {
        Error::StorageUnavailable(_) => err,
        other => Error::StorageUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Direction, SortField};
    use crate::schema::NoteCandidate;
    use crate::storage::{Database, MemoryStorage};
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::tempdir;

    const KEY: &str = DEFAULT_STORAGE_KEY;

    fn manual_clock(start: i64) -> (Rc<Cell<i64>>, impl Fn() -> i64) {
        let time = Rc::new(Cell::new(start));
        let handle = Rc::clone(&time);
        (time, move || handle.get())
    }

    fn setup_store() -> (Rc<Cell<i64>>, NoteStore<MemoryStorage>) {
        let (time, clock) = manual_clock(1_000);
        let store = NoteStore::open(MemoryStorage::new(), KEY).unwrap().with_clock(clock);
        (time, store)
    }

    fn note(store: &NoteStore<MemoryStorage>, title: &str) -> Note {
        NoteCandidate::new(store.generate_id(), title)
            .validate(store.now_millis())
            .unwrap()
    }

    /// Storage whose writes can be switched off
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: Rc<Cell<bool>>,
    }

    impl KeyValueStore for FlakyStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.get() {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "quota exceeded",
                )));
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&mut self, key: &str) -> Result<()> {
            self.inner.remove_item(key)
        }

        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_first_run_is_empty() {
        let store = NoteStore::open(MemoryStorage::new(), KEY).unwrap();
        assert!(store.is_ready());
        assert!(store.is_empty());
        assert_eq!(store.summary(), Summary::default());
    }

    #[test]
    fn test_insert_then_get_roundtrip() {
        let (_time, mut store) = setup_store();
        let buy_milk = note(&store, "  Buy milk ");

        store.insert(buy_milk.clone()).unwrap();

        assert_eq!(store.get(&buy_milk.id), Some(&buy_milk));
        assert_eq!(store.find(&buy_milk.id), vec![buy_milk]);
    }

    #[test]
    fn test_insert_persists_serialized_map() {
        let (_time, mut store) = setup_store();
        let n = note(&store, "Buy milk");
        store.insert(n.clone()).unwrap();

        let raw = store.storage().get_item(KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[&n.id]["title"], "Buy milk");
        assert_eq!(value[&n.id]["is_favorite"], false);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let (_time, mut store) = setup_store();
        let n = note(&store, "Once");
        store.insert(n.clone()).unwrap();

        let err = store.insert(n).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalid_note_never_inserted() {
        let (_time, mut store) = setup_store();
        let mut bad = note(&store, "fine");
        bad.title = "x".repeat(101);

        let err = store.insert(bad).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.is_empty());
        assert_eq!(store.storage().get_item(KEY).unwrap(), None);
    }

    #[test]
    fn test_toggle_twice_restores_and_bumps() {
        let (time, mut store) = setup_store();
        let n = note(&store, "Toggle me");
        store.insert(n.clone()).unwrap();

        let first = store.toggle_favorite(&n.id).unwrap();
        assert!(first.is_favorite);
        assert!(first.updated_at > n.updated_at);

        // Clock has not moved; updated_at must still increase
        let second = store.toggle_favorite(&n.id).unwrap();
        assert!(!second.is_favorite);
        assert!(second.updated_at > first.updated_at);

        time.set(5_000);
        let third = store.toggle_favorite(&n.id).unwrap();
        assert_eq!(third.updated_at, 5_000);
        assert_eq!(third.created_at, n.created_at);
    }

    #[test]
    fn test_update_rejects_immutable_fields() {
        let (_time, mut store) = setup_store();
        let n = note(&store, "Fixed");
        store.insert(n.clone()).unwrap();

        let err = store.update(&n.id, |d| d.id = "other".to_string()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = store.update(&n.id, |d| d.created_at += 1).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = store.update(&n.id, |d| d.title = "  ".to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert_eq!(store.get(&n.id), Some(&n));
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let (_time, mut store) = setup_store();
        assert!(matches!(store.toggle_favorite("nope"), Err(Error::NotFound(_))));
        assert!(matches!(store.delete("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_removes_from_queries() {
        let (_time, mut store) = setup_store();
        let a = note(&store, "a");
        let b = note(&store, "b");
        store.insert(a.clone()).unwrap();
        store.insert(b.clone()).unwrap();

        let removed = store.delete(&a.id).unwrap();
        assert_eq!(removed, a);
        assert_eq!(store.len(), 1);
        assert!(store.query(&Query::all()).iter().all(|n| n.id != a.id));
        assert!(store.find(&a.id).is_empty());
    }

    #[test]
    fn test_favorite_count_matches_filtered_view() {
        let (_time, mut store) = setup_store();
        let mut ids = Vec::new();
        for i in 0..6 {
            let n = note(&store, &format!("note {}", i));
            ids.push(n.id.clone());
            store.insert(n).unwrap();
        }
        store.toggle_favorite(&ids[1]).unwrap();
        store.toggle_favorite(&ids[4]).unwrap();
        store.toggle_favorite(&ids[5]).unwrap();
        store.toggle_favorite(&ids[5]).unwrap();
        store.delete(&ids[4]).unwrap();

        let favorites = store.query(&Query::favorites());
        assert_eq!(store.favorite_count(), favorites.len());
        assert_eq!(store.summary(), Summary { total: 5, favorites: 1 });
    }

    #[test]
    fn test_buy_milk_scenario() {
        let (time, mut store) = setup_store();
        let all = store.live_query(Query::newest_first());

        let n = note(&store, "Buy milk");
        assert!(!n.is_favorite);
        assert!(!n.id.is_empty());
        assert_eq!(n.created_at, n.updated_at);
        store.insert(n.clone()).unwrap();
        assert_eq!(all.len(), 1);

        time.set(2_000);
        let toggled = store.toggle_favorite(&n.id).unwrap();
        assert!(toggled.is_favorite);
        assert!(toggled.updated_at > toggled.created_at);
        assert!(all.data()[0].is_favorite);

        store.delete(&n.id).unwrap();
        assert_eq!(store.len(), 0);
        assert!(all.is_empty());
        assert!(!all.is_loading());
    }

    #[test]
    fn test_live_query_loading_until_load() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(KEY, r#"{"1":{"id":"1","title":"Stored","is_favorite":true,"created_at":1,"updated_at":1}}"#)
            .unwrap();

        let mut store = NoteStore::new(storage, KEY);
        let favorites = store.live_query(Query::favorites());
        assert!(favorites.is_loading());
        assert!(favorites.data().is_empty());

        store.load().unwrap();
        assert!(!favorites.is_loading());
        assert_eq!(favorites.data()[0].title, "Stored");
    }

    #[test]
    fn test_subscribers_notified_on_every_commit() {
        let (_time, mut store) = setup_store();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(Query::all(), move |notes| sink.borrow_mut().push(notes.len()));

        // Immediate delivery because the store is already loaded
        assert_eq!(*seen.borrow(), vec![0]);

        let n = note(&store, "one");
        store.insert(n.clone()).unwrap();
        store.toggle_favorite(&n.id).unwrap();
        store.delete(&n.id).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1, 1, 0]);

        // Failed operations do not notify
        let _ = store.delete(&n.id);
        assert_eq!(seen.borrow().len(), 4);

        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.insert(note(&store, "two")).unwrap();
        assert_eq!(seen.borrow().len(), 4);
    }

    #[test]
    fn test_ordered_live_query() {
        let (time, mut store) = setup_store();
        let ordered = store.live_query(Query::all().order_by(SortField::CreatedAt, Direction::Desc));

        for (t, title) in [(10, "old"), (30, "new"), (20, "mid")] {
            time.set(t);
            store.insert(note(&store, title)).unwrap();
        }

        let titles: Vec<_> = ordered.data().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, ["new", "mid", "old"]);
    }

    #[test]
    fn test_storage_failure_rolls_back() {
        let fail = Rc::new(Cell::new(false));
        let storage = FlakyStorage {
            inner: MemoryStorage::new(),
            fail_writes: Rc::clone(&fail),
        };
        let mut store = NoteStore::open(storage, KEY).unwrap();
        let all = store.live_query(Query::all());

        let kept = NoteCandidate::new("kept", "kept").validate(1).unwrap();
        store.insert(kept.clone()).unwrap();

        fail.set(true);
        let lost = NoteCandidate::new("lost", "lost").validate(1).unwrap();
        let err = store.insert(lost).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert!(err.is_storage());
        assert!(!store.contains("lost"));

        assert!(store.toggle_favorite("kept").is_err());
        assert!(!store.get("kept").unwrap().is_favorite);

        assert!(store.delete("kept").is_err());
        assert!(store.contains("kept"));
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_load_skips_invalid_records() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                KEY,
                r#"{
                    "good": {"id":"good","title":"ok","created_at":1,"updated_at":2},
                    "blank": {"id":"blank","title":"   "},
                    "moved": {"id":"elsewhere","title":"wrong key"}
                }"#,
            )
            .unwrap();

        let store = NoteStore::open(storage, KEY).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains("good"));
    }

    #[test]
    fn test_skipped_records_survive_writes() {
        let long_title = "x".repeat(110);
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                KEY,
                &json!({
                    "old": { "id": "old", "title": long_title, "created_at": 1, "updated_at": 1 },
                    "moved": { "id": "elsewhere", "title": "wrong key" }
                })
                .to_string(),
            )
            .unwrap();

        let mut store = NoteStore::open(storage, KEY).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.skipped_count(), 2);

        let fresh = NoteCandidate::new("new", "fresh").validate(1).unwrap();
        store.insert(fresh).unwrap();
        store.toggle_favorite("new").unwrap();

        let raw = store.storage().get_item(KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["old"]["title"], long_title.as_str());
        assert_eq!(value["moved"]["id"], "elsewhere");
        assert_eq!(value["new"]["is_favorite"], true);

        // The skipped key stays reserved
        let clash = NoteCandidate::new("old", "clash").validate(1).unwrap();
        assert!(matches!(store.insert(clash), Err(Error::DuplicateId(_))));

        store.delete("new").unwrap();
        let raw = store.storage().get_item(KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("old").is_some());
        assert!(value.get("new").is_none());
    }

    #[test]
    fn test_filled_in_timestamps_are_written_back() {
        let mut storage = MemoryStorage::new();
        storage.set_item(KEY, r#"{"a":{"id":"a","title":" untimed "}}"#).unwrap();

        let store = NoteStore::open(storage, KEY).unwrap();
        let first = store.get("a").unwrap().clone();
        assert_eq!(first.title, "untimed");

        let raw = store.storage().get_item(KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["a"]["created_at"], first.created_at);
        assert_eq!(value["a"]["title"], "untimed");

        // A later load with a different clock keeps the stored time
        let (_time, clock) = manual_clock(first.created_at + 60_000);
        let mut reopened = NoteStore::new(MemoryStorage::new(), KEY).with_clock(clock);
        reopened.storage.set_item(KEY, &raw).unwrap();
        reopened.load().unwrap();
        assert_eq!(reopened.get("a").unwrap().created_at, first.created_at);
    }

    #[test]
    fn test_update_at_timestamp_limit_is_an_error() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                KEY,
                &json!({ "late": { "id": "late", "title": "t", "created_at": 0, "updated_at": i64::MAX - 1 } })
                    .to_string(),
            )
            .unwrap();

        let mut store = NoteStore::open(storage, KEY).unwrap();
        let err = store.toggle_favorite("late").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!store.get("late").unwrap().is_favorite);
    }

    #[test]
    fn test_corrupt_payload_is_an_error() {
        let mut storage = MemoryStorage::new();
        storage.set_item(KEY, "not json").unwrap();

        let mut store = NoteStore::new(storage, KEY);
        assert!(matches!(store.load(), Err(Error::Serialization(_))));
        assert_eq!(store.status(), CollectionStatus::Idle);
    }

    #[test]
    fn test_mutation_loads_idle_store() {
        let mut store = NoteStore::new(MemoryStorage::new(), KEY);
        let n = NoteCandidate::new("1", "lazy").validate(1).unwrap();
        store.insert(n).unwrap();
        assert!(store.is_ready());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("notes.db"));

        let id = {
            let mut store = NoteStore::open(db.open_storage().unwrap(), KEY).unwrap();
            let n = Note::new("Survives restart").unwrap();
            store.insert(n.clone()).unwrap();
            store.toggle_favorite(&n.id).unwrap();
            n.id
        };

        let store = NoteStore::open(db.open_storage().unwrap(), KEY).unwrap();
        let reloaded = store.get(&id).unwrap();
        assert_eq!(reloaded.title, "Survives restart");
        assert!(reloaded.is_favorite);
        assert!(reloaded.updated_at > reloaded.created_at);
    }

    #[test]
    fn test_separate_storage_keys_are_isolated() {
        let mut storage = MemoryStorage::new();
        storage.set_item("other", r#"{"x":{"id":"x","title":"other"}}"#).unwrap();

        let store = NoteStore::open(storage, KEY).unwrap();
        assert!(store.is_empty());
    }
}
