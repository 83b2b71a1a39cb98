//! SQLite-backed relational index backend.

use crate::backend::{BasketQuery, IndexBackend};
use crate::error::{IndexError, IndexResult};
use crate::models::BasketRow;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pantry_index (
    uuid TEXT PRIMARY KEY,
    upload_time INTEGER NOT NULL,
    parent_uuids TEXT NOT NULL,
    basket_type TEXT NOT NULL,
    label TEXT,
    address TEXT NOT NULL,
    storage_type TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pantry_index_basket_type ON pantry_index(basket_type);
CREATE INDEX IF NOT EXISTS idx_pantry_index_upload_time ON pantry_index(upload_time);

CREATE TABLE IF NOT EXISTS parent_uuids (
    uuid TEXT NOT NULL,
    parent_uuid TEXT NOT NULL,
    PRIMARY KEY (uuid, parent_uuid)
);

CREATE INDEX IF NOT EXISTS idx_parent_uuids_parent ON parent_uuids(parent_uuid);
"#;

/// Relational index backend on SQLite.
///
/// The `parent_uuids` join table is maintained in the same transaction as
/// each row upsert, so child lookups are an indexed query instead of a full
/// table scan.
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
}

impl SqliteBackend {
    /// Open (or create) the index database at `path` and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| IndexError::Internal(format!("create index dir: {e}")))?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
            .map_err(IndexError::Database)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let backend = Self { pool };
        backend.migrate().await?;
        Ok(backend)
    }

    /// Run schema migrations.
    async fn migrate(&self) -> IndexResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> IndexResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn encode_time(time: OffsetDateTime) -> i64 {
        // Nanoseconds since epoch; fits i64 until the year 2262.
        time.unix_timestamp_nanos() as i64
    }

    fn decode_time(nanos: i64) -> IndexResult<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(nanos as i128)
            .map_err(|e| IndexError::InvalidRow(format!("bad upload_time: {e}")))
    }

    fn decode_row(
        (uuid, upload_time, parent_uuids, basket_type, label, address, storage_type): SqlRow,
    ) -> IndexResult<BasketRow> {
        Ok(BasketRow {
            uuid: Uuid::parse_str(&uuid)
                .map_err(|e| IndexError::InvalidRow(format!("bad uuid: {e}")))?,
            upload_time: Self::decode_time(upload_time)?,
            parent_uuids: serde_json::from_str(&parent_uuids)
                .map_err(|e| IndexError::InvalidRow(format!("bad parent_uuids: {e}")))?,
            basket_type,
            label,
            address,
            storage_type,
        })
    }
}

type SqlRow = (String, i64, String, String, Option<String>, String, String);

const SELECT_COLUMNS: &str =
    "SELECT uuid, upload_time, parent_uuids, basket_type, label, address, storage_type \
     FROM pantry_index";

#[async_trait]
impl IndexBackend for SqliteBackend {
    async fn upsert(&self, row: &BasketRow) -> IndexResult<()> {
        let parent_json = serde_json::to_string(&row.parent_uuids)
            .map_err(|e| IndexError::Internal(format!("encode parent_uuids: {e}")))?;

        // Row and join-table rows move together or not at all.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pantry_index (
                uuid, upload_time, parent_uuids, basket_type, label, address, storage_type
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(uuid) DO UPDATE SET
                upload_time = excluded.upload_time,
                parent_uuids = excluded.parent_uuids,
                basket_type = excluded.basket_type,
                label = excluded.label,
                address = excluded.address,
                storage_type = excluded.storage_type
            "#,
        )
        .bind(row.uuid.to_string())
        .bind(Self::encode_time(row.upload_time))
        .bind(&parent_json)
        .bind(&row.basket_type)
        .bind(&row.label)
        .bind(&row.address)
        .bind(&row.storage_type)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM parent_uuids WHERE uuid = ?")
            .bind(row.uuid.to_string())
            .execute(&mut *tx)
            .await?;

        for parent in &row.parent_uuids {
            sqlx::query("INSERT OR IGNORE INTO parent_uuids (uuid, parent_uuid) VALUES (?, ?)")
                .bind(row.uuid.to_string())
                .bind(parent.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, uuid: Uuid) -> IndexResult<Option<BasketRow>> {
        let row: Option<SqlRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE uuid = ?"))
                .bind(uuid.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Self::decode_row).transpose()
    }

    async fn query(&self, query: &BasketQuery) -> IndexResult<Vec<BasketRow>> {
        let mut conditions: Vec<&str> = Vec::new();
        if query.basket_type.is_some() {
            conditions.push("basket_type = ?");
        }
        if query.label.is_some() {
            conditions.push("label = ?");
        }
        if query.uploaded_after.is_some() {
            conditions.push("upload_time >= ?");
        }
        if query.uploaded_before.is_some() {
            conditions.push("upload_time <= ?");
        }
        if query.parent_uuid.is_some() {
            conditions.push("uuid IN (SELECT uuid FROM parent_uuids WHERE parent_uuid = ?)");
        }

        let mut sql = SELECT_COLUMNS.to_string();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if query.sort_by_upload_time {
            sql.push_str(" ORDER BY upload_time");
        }

        let mut q = sqlx::query_as::<_, SqlRow>(&sql);
        if let Some(basket_type) = &query.basket_type {
            q = q.bind(basket_type);
        }
        if let Some(label) = &query.label {
            q = q.bind(label);
        }
        if let Some(after) = query.uploaded_after {
            q = q.bind(Self::encode_time(after));
        }
        if let Some(before) = query.uploaded_before {
            q = q.bind(Self::encode_time(before));
        }
        if let Some(parent) = query.parent_uuid {
            q = q.bind(parent.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::decode_row).collect()
    }

    async fn delete(&self, uuid: Uuid) -> IndexResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM pantry_index WHERE uuid = ?")
            .bind(uuid.to_string())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM parent_uuids WHERE uuid = ?")
            .bind(uuid.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn all(&self) -> IndexResult<Vec<BasketRow>> {
        let rows: Vec<SqlRow> = sqlx::query_as(SELECT_COLUMNS).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::decode_row).collect()
    }

    async fn count(&self) -> IndexResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pantry_index")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
