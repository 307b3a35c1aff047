use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::EntityId;

/// Version number of a stored record, used for optimistic concurrency control.
///
/// A record that does not exist is at version 0; the first insert stores
/// version 1 and every later update increments it by 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a record that does not exist yet (0).
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version stored on first insert (1).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// Address of a record: its collection plus its id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub collection: String,
    pub id: EntityId,
}

impl RecordKey {
    /// Creates a key for an arbitrary collection.
    pub fn new(collection: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates the key under which a record of type `T` with `id` is stored.
    pub fn of<T: Record>(id: impl Into<EntityId>) -> Self {
        Self::new(T::collection(), id)
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A record as it sits in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub key: RecordKey,

    /// Version after the last committed write.
    pub version: Version,

    /// When the last committed write happened.
    pub updated_at: DateTime<Utc>,

    /// The record body as JSON.
    pub body: serde_json::Value,
}

impl StoredRecord {
    /// Deserializes the body into a typed record.
    pub fn decode<T: Record>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}

/// Trait for entities persisted in the record store.
///
/// The collection name groups records of one type the way a table would.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the collection this record type lives in.
    fn collection() -> &'static str;

    /// Returns the record's identifier within its collection.
    fn id(&self) -> EntityId;

    /// Returns the key under which this record is stored.
    fn key(&self) -> RecordKey {
        RecordKey::new(Self::collection(), self.id())
    }
}
