use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EntityId, RecordKey, Result, StoreError, StoredRecord, Version,
    store::{Changeset, RecordStore, Write},
};

/// PostgreSQL-backed record store implementation.
///
/// All records live in one `records` table keyed by `(collection, id)`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<StoredRecord> {
        Ok(StoredRecord {
            key: RecordKey::new(
                row.try_get::<String, _>("collection")?,
                EntityId::from_uuid(row.try_get::<Uuid, _>("id")?),
            ),
            version: Version::new(row.try_get("version")?),
            updated_at: row.try_get("updated_at")?,
            body: row.try_get("body")?,
        })
    }

    async fn current_version(
        tx: &mut Transaction<'_, Postgres>,
        key: &RecordKey,
    ) -> Result<Version> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM records WHERE collection = $1 AND id = $2")
                .bind(&key.collection)
                .bind(key.id.as_uuid())
                .fetch_optional(&mut **tx)
                .await?;
        Ok(version.map(Version::new).unwrap_or(Version::initial()))
    }

    async fn conflict(
        tx: &mut Transaction<'_, Postgres>,
        key: &RecordKey,
        expected: Version,
    ) -> StoreError {
        match Self::current_version(tx, key).await {
            Ok(actual) => StoreError::ConcurrencyConflict {
                key: key.clone(),
                expected,
                actual,
            },
            Err(e) => e,
        }
    }

    async fn apply_put(
        tx: &mut Transaction<'_, Postgres>,
        key: &RecordKey,
        body: &serde_json::Value,
        expected: Option<Version>,
    ) -> Result<()> {
        match expected {
            // Observed absent: the row must still be absent at insert time
            Some(expected) if expected == Version::initial() => {
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO records (collection, id, version, body, updated_at)
                    VALUES ($1, $2, 1, $3, NOW())
                    ON CONFLICT (collection, id) DO NOTHING
                    "#,
                )
                .bind(&key.collection)
                .bind(key.id.as_uuid())
                .bind(body)
                .execute(&mut **tx)
                .await?;

                if inserted.rows_affected() == 0 {
                    return Err(Self::conflict(tx, key, expected).await);
                }
                Ok(())
            }
            Some(expected) => {
                let updated = sqlx::query(
                    r#"
                    UPDATE records
                    SET version = version + 1, body = $3, updated_at = NOW()
                    WHERE collection = $1 AND id = $2 AND version = $4
                    "#,
                )
                .bind(&key.collection)
                .bind(key.id.as_uuid())
                .bind(body)
                .bind(expected.as_i64())
                .execute(&mut **tx)
                .await?;

                if updated.rows_affected() == 0 {
                    return Err(Self::conflict(tx, key, expected).await);
                }
                Ok(())
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO records (collection, id, version, body, updated_at)
                    VALUES ($1, $2, 1, $3, NOW())
                    ON CONFLICT (collection, id) DO UPDATE SET
                        version = records.version + 1,
                        body = EXCLUDED.body,
                        updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(&key.collection)
                .bind(key.id.as_uuid())
                .bind(body)
                .execute(&mut **tx)
                .await?;
                Ok(())
            }
        }
    }

    async fn apply_delete(
        tx: &mut Transaction<'_, Postgres>,
        key: &RecordKey,
        expected: Option<Version>,
    ) -> Result<()> {
        match expected {
            Some(expected) if expected != Version::initial() => {
                let deleted = sqlx::query(
                    "DELETE FROM records WHERE collection = $1 AND id = $2 AND version = $3",
                )
                .bind(&key.collection)
                .bind(key.id.as_uuid())
                .bind(expected.as_i64())
                .execute(&mut **tx)
                .await?;

                if deleted.rows_affected() == 0 {
                    return Err(Self::conflict(tx, key, expected).await);
                }
                Ok(())
            }
            _ => {
                sqlx::query("DELETE FROM records WHERE collection = $1 AND id = $2")
                    .bind(&key.collection)
                    .bind(key.id.as_uuid())
                    .execute(&mut **tx)
                    .await?;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<StoredRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT collection, id, version, body, updated_at
            FROM records
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(&key.collection)
        .bind(key.id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT collection, id, version, body, updated_at
            FROM records
            WHERE collection = $1
            ORDER BY updated_at ASC, id ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn commit(&self, changeset: Changeset) -> Result<()> {
        if changeset.is_empty() {
            return Ok(());
        }

        // Dropping the transaction without commit rolls it back
        let mut tx = self.pool.begin().await?;

        // Keys that are only read must still be unchanged; lock them against writers
        for (key, expected) in &changeset.expectations {
            if changeset.writes.contains_key(key) {
                continue;
            }

            let actual: Option<i64> = sqlx::query_scalar(
                "SELECT version FROM records WHERE collection = $1 AND id = $2 FOR SHARE",
            )
            .bind(&key.collection)
            .bind(key.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

            let actual = actual.map(Version::new).unwrap_or(Version::initial());
            if actual != *expected {
                return Err(StoreError::ConcurrencyConflict {
                    key: key.clone(),
                    expected: *expected,
                    actual,
                });
            }
        }

        for (key, write) in &changeset.writes {
            let expected = changeset.expectations.get(key).copied();
            match write {
                Write::Put(body) => Self::apply_put(&mut tx, key, body, expected).await?,
                Write::Delete => Self::apply_delete(&mut tx, key, expected).await?,
            }
        }

        tx.commit().await?;
        metrics::counter!("store_commits_total").increment(1);
        Ok(())
    }
}
