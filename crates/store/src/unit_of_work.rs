//! Unit of work: the explicit begin/commit/abort handle.
//!
//! Reads go through the handle so the first observed version of every key is
//! remembered; writes are buffered and only reach the store on `commit`.
//! Dropping the handle without committing discards everything, which makes a
//! cancelled caller equivalent to an abort.

use std::collections::{BTreeMap, HashMap};

use crate::{Changeset, EntityId, Record, RecordKey, RecordStore, Result, Version, Write};

/// A single atomic unit of reads and buffered writes against a record store.
pub struct UnitOfWork<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    /// Version observed on first read of each key.
    expectations: BTreeMap<RecordKey, Version>,
    /// Current view of every key touched so far (None = absent or deleted).
    overlay: HashMap<RecordKey, Option<serde_json::Value>>,
    writes: BTreeMap<RecordKey, Write>,
}

impl<'a, S: RecordStore + ?Sized> UnitOfWork<'a, S> {
    /// Begins a new unit of work.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            expectations: BTreeMap::new(),
            overlay: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Loads a record as seen from inside this unit.
    ///
    /// Pending writes of this unit are visible; otherwise the record is read
    /// from the store and its version becomes a commit-time expectation.
    pub async fn get<T: Record>(&mut self, id: impl Into<EntityId>) -> Result<Option<T>> {
        let key = RecordKey::of::<T>(id);

        if !self.overlay.contains_key(&key) {
            let stored = self.store.get(&key).await?;
            let (version, body) = match stored {
                Some(record) => (record.version, Some(record.body)),
                None => (Version::initial(), None),
            };
            self.expectations.entry(key.clone()).or_insert(version);
            self.overlay.insert(key.clone(), body);
        }

        match self.overlay.get(&key) {
            Some(Some(body)) => Ok(Some(serde_json::from_value(body.clone())?)),
            _ => Ok(None),
        }
    }

    /// Buffers an insert or replacement of `record`.
    pub fn put<T: Record>(&mut self, record: &T) -> Result<()> {
        let key = record.key();
        let body = serde_json::to_value(record)?;
        self.overlay.insert(key.clone(), Some(body.clone()));
        self.writes.insert(key, Write::Put(body));
        Ok(())
    }

    /// Buffers the removal of the record of type `T` with `id`.
    pub fn delete<T: Record>(&mut self, id: impl Into<EntityId>) {
        let key = RecordKey::of::<T>(id);
        self.overlay.insert(key.clone(), None);
        self.writes.insert(key, Write::Delete);
    }

    /// Returns the number of buffered writes.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if nothing has been written yet.
    pub fn is_clean(&self) -> bool {
        self.writes.is_empty()
    }

    /// Turns the buffered state into a changeset without committing it.
    pub fn into_changeset(self) -> Changeset {
        Changeset {
            expectations: self.expectations,
            writes: self.writes,
        }
    }

    /// Commits every buffered write atomically.
    ///
    /// Fails with `ConcurrencyConflict` if any record read by this unit was
    /// changed by someone else in the meantime; nothing is written then.
    pub async fn commit(self) -> Result<usize> {
        let store = self.store;
        let changeset = self.into_changeset();
        let written = changeset.writes.len();

        if changeset.is_empty() {
            return Ok(0);
        }

        store.commit(changeset).await?;
        tracing::debug!(written, "unit of work committed");
        Ok(written)
    }

    /// Discards every buffered write.
    pub fn abort(self) {
        tracing::debug!(discarded = self.writes.len(), "unit of work aborted");
    }
}
