//! The polymorphic index backend contract.

use crate::error::IndexResult;
use crate::models::BasketRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Predicate for `IndexBackend::query`.
///
/// All set fields must match. Result order is unspecified unless
/// `sort_by_upload_time` is requested.
#[derive(Clone, Debug, Default)]
pub struct BasketQuery {
    pub basket_type: Option<String>,
    pub label: Option<String>,
    pub uploaded_after: Option<OffsetDateTime>,
    pub uploaded_before: Option<OffsetDateTime>,
    /// Match rows whose `parent_uuids` contains this UUID.
    pub parent_uuid: Option<Uuid>,
    pub sort_by_upload_time: bool,
}

impl BasketQuery {
    pub fn of_type(basket_type: impl Into<String>) -> Self {
        Self {
            basket_type: Some(basket_type.into()),
            ..Self::default()
        }
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn with_parent(parent_uuid: Uuid) -> Self {
        Self {
            parent_uuid: Some(parent_uuid),
            ..Self::default()
        }
    }

    pub fn uploaded_between(
        after: Option<OffsetDateTime>,
        before: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            uploaded_after: after,
            uploaded_before: before,
            ..Self::default()
        }
    }

    pub fn sorted(mut self) -> Self {
        self.sort_by_upload_time = true;
        self
    }

    /// Evaluate the predicate against a row. Used by tabular backends; the
    /// relational backend compiles the same predicate to SQL.
    pub fn matches(&self, row: &BasketRow) -> bool {
        if let Some(basket_type) = &self.basket_type {
            if &row.basket_type != basket_type {
                return false;
            }
        }
        if let Some(label) = &self.label {
            if row.label.as_deref() != Some(label.as_str()) {
                return false;
            }
        }
        if let Some(after) = self.uploaded_after {
            if row.upload_time < after {
                return false;
            }
        }
        if let Some(before) = self.uploaded_before {
            if row.upload_time > before {
                return false;
            }
        }
        if let Some(parent) = self.parent_uuid {
            if !row.parent_uuids.contains(&parent) {
                return false;
            }
        }
        true
    }
}

/// Storage contract for the basket index.
///
/// One row per basket keyed by UUID. Implementations must make `upsert`
/// idempotent and `delete` a row-only operation (storage is never touched).
/// The index is a best-effort materialized view over storage: it may lag,
/// but it is refreshed by `sync_index` or incrementally by the pantry after
/// each mutating operation.
#[async_trait]
pub trait IndexBackend: Send + Sync + 'static {
    /// Insert or overwrite the row keyed by `row.uuid`.
    async fn upsert(&self, row: &BasketRow) -> IndexResult<()>;

    /// Point lookup by UUID.
    async fn get(&self, uuid: Uuid) -> IndexResult<Option<BasketRow>>;

    /// Rows matching the predicate.
    async fn query(&self, query: &BasketQuery) -> IndexResult<Vec<BasketRow>>;

    /// Remove the row; does not touch storage. Removing an absent row is
    /// not an error.
    async fn delete(&self, uuid: Uuid) -> IndexResult<()>;

    /// All rows.
    async fn all(&self) -> IndexResult<Vec<BasketRow>>;

    /// Number of rows.
    async fn count(&self) -> IndexResult<u64>;

    /// Static identifier for the backend type (e.g., "memory", "sqlite").
    fn backend_name(&self) -> &'static str;
}
