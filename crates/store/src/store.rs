use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{EntityId, Record, RecordKey, Result, StoredRecord, UnitOfWork, Version};

/// A buffered write.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Insert or replace the record body.
    Put(serde_json::Value),
    /// Remove the record.
    Delete,
}

/// Everything a unit of work wants to commit.
///
/// `expectations` holds the version observed for every key that was read
/// (0 for keys observed absent); the store must reject the commit if any of
/// them moved. Keys are ordered so implementations lock rows in a stable order.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    pub expectations: BTreeMap<RecordKey, Version>,
    pub writes: BTreeMap<RecordKey, Write>,
}

impl Changeset {
    /// Creates an empty changeset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the version a key is expected to have at commit time.
    pub fn expect(mut self, key: RecordKey, version: Version) -> Self {
        self.expectations.insert(key, version);
        self
    }

    /// Buffers a put.
    pub fn put(mut self, key: RecordKey, body: serde_json::Value) -> Self {
        self.writes.insert(key, Write::Put(body));
        self
    }

    /// Buffers a delete.
    pub fn delete(mut self, key: RecordKey) -> Self {
        self.writes.insert(key, Write::Delete);
        self
    }

    /// Returns true if there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Core trait for record store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loads a single record.
    ///
    /// Returns None if no record is stored under `key`.
    async fn get(&self, key: &RecordKey) -> Result<Option<StoredRecord>>;

    /// Loads every record of a collection.
    async fn list(&self, collection: &str) -> Result<Vec<StoredRecord>>;

    /// Commits a changeset.
    ///
    /// The commit is atomic: either every expectation holds and every write
    /// is applied, or the store is left untouched and `ConcurrencyConflict`
    /// (or another error) is returned.
    async fn commit(&self, changeset: Changeset) -> Result<()>;
}

/// Extension trait providing typed convenience methods for record stores.
#[async_trait]
pub trait RecordStoreExt: RecordStore {
    /// Opens a unit of work against this store.
    fn begin(&self) -> UnitOfWork<'_, Self> {
        UnitOfWork::new(self)
    }

    /// Loads and decodes a single record outside any unit of work.
    async fn fetch<T: Record, I: Into<EntityId> + Send>(&self, id: I) -> Result<Option<T>> {
        let key = RecordKey::of::<T>(id);
        match self.get(&key).await? {
            Some(stored) => Ok(Some(stored.decode()?)),
            None => Ok(None),
        }
    }

    /// Loads and decodes every record of type `T`.
    async fn fetch_all<T: Record>(&self) -> Result<Vec<T>> {
        let stored = self.list(T::collection()).await?;
        let mut records = Vec::with_capacity(stored.len());
        for record in stored {
            records.push(record.decode()?);
        }
        Ok(records)
    }

    /// Checks if a record exists.
    async fn exists<T: Record, I: Into<EntityId> + Send>(&self, id: I) -> Result<bool> {
        Ok(self.get(&RecordKey::of::<T>(id)).await?.is_some())
    }
}

// Blanket implementation for all RecordStore implementations
impl<T: RecordStore + ?Sized> RecordStoreExt for T {}
