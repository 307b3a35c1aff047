use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    RecordKey, Result, StoreError, StoredRecord, Version,
    store::{Changeset, RecordStore, Write},
};

/// In-memory record store implementation for testing.
///
/// This implementation keeps every record in a map and provides the same
/// atomic, version-checked commit semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<RecordKey, StoredRecord>>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail with a database error (once).
    pub fn fail_next_commit(&self, fail: bool) {
        self.fail_next_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns the number of records in one collection.
    pub async fn collection_len(&self, collection: &str) -> usize {
        self.records
            .read()
            .await
            .keys()
            .filter(|key| key.collection == collection)
            .count()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<StoredRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredRecord>> {
        let records = self.records.read().await;
        let mut listed: Vec<_> = records
            .values()
            .filter(|record| record.key.collection == collection)
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.key.cmp(&b.key)));
        Ok(listed)
    }

    async fn commit(&self, changeset: Changeset) -> Result<()> {
        let mut records = self.records.write().await;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        // Validate every expectation before touching anything
        for (key, expected) in &changeset.expectations {
            let actual = records
                .get(key)
                .map(|record| record.version)
                .unwrap_or(Version::initial());
            if actual != *expected {
                return Err(StoreError::ConcurrencyConflict {
                    key: key.clone(),
                    expected: *expected,
                    actual,
                });
            }
        }

        let now = Utc::now();
        for (key, write) in changeset.writes {
            match write {
                Write::Put(body) => {
                    let version = records
                        .get(&key)
                        .map(|record| record.version)
                        .unwrap_or(Version::initial())
                        .next();
                    records.insert(
                        key.clone(),
                        StoredRecord {
                            key,
                            version,
                            updated_at: now,
                            body,
                        },
                    );
                }
                Write::Delete => {
                    records.remove(&key);
                }
            }
        }

        Ok(())
    }
}
