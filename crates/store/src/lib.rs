pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;
pub mod unit_of_work;

pub use common::EntityId;
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use record::{Record, RecordKey, StoredRecord, Version};
pub use store::{Changeset, RecordStore, RecordStoreExt, Write};
pub use unit_of_work::UnitOfWork;
