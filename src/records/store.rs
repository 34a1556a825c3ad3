use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::records::models::{DiaryRecord, RecordDraft, RecordPatch};

/// Persistence boundary for diary records.
///
/// Mutations are scoped by `id AND owner` so an ownership mismatch and a
/// missing record are indistinguishable at this layer already. `scan_page`
/// orders by `(date DESC, id DESC)` - newest practice day first, id as the
/// stable tiebreak - and starts at the cursor record's position (inclusive)
/// when a cursor is given.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Insert with a freshly assigned id.
    async fn insert(&self, owner: Uuid, draft: RecordDraft) -> Result<DiaryRecord>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DiaryRecord>>;

    /// Owner reference only; `None` when the record does not exist.
    async fn owner_of(&self, id: Uuid) -> Result<Option<Uuid>>;

    /// Apply the present patch fields to the record matching `id AND owner`.
    /// `None` when no such record exists.
    async fn update_where(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: RecordPatch,
    ) -> Result<Option<DiaryRecord>>;

    /// Rows removed. 0 means no record matched `id AND owner`; anything
    /// above 1 means the id uniqueness invariant is broken.
    async fn delete_where(&self, id: Uuid, owner: Uuid) -> Result<u64>;

    /// Up to `fetch` records in feed order, optionally filtered to one
    /// owner. An unresolvable cursor id is a validation error.
    async fn scan_page(
        &self,
        owner: Option<Uuid>,
        cursor: Option<Uuid>,
        fetch: i64,
    ) -> Result<Vec<DiaryRecord>>;

    /// All records of one owner (export / external list).
    async fn scan_by_owner(&self, owner: Uuid) -> Result<Vec<DiaryRecord>>;
}

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, owner: Uuid, draft: RecordDraft) -> Result<DiaryRecord> {
        let record = sqlx::query_as::<_, DiaryRecord>(
            "INSERT INTO records (id, owner, date, time_spent, language, rating, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(draft.date)
        .bind(&draft.time_spent)
        .bind(&draft.language)
        .bind(draft.rating)
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DiaryRecord>> {
        let record = sqlx::query_as::<_, DiaryRecord>("SELECT * FROM records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn owner_of(&self, id: Uuid) -> Result<Option<Uuid>> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT owner FROM records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn update_where(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: RecordPatch,
    ) -> Result<Option<DiaryRecord>> {
        let record = sqlx::query_as::<_, DiaryRecord>(
            "UPDATE records SET \
                date = COALESCE($1, date), \
                time_spent = COALESCE($2, time_spent), \
                language = COALESCE($3, language), \
                rating = COALESCE($4, rating), \
                description = COALESCE($5, description) \
             WHERE id = $6 AND owner = $7 RETURNING *",
        )
        .bind(patch.date)
        .bind(patch.time_spent)
        .bind(patch.language)
        .bind(patch.rating)
        .bind(patch.description)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete_where(&self, id: Uuid, owner: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM records WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn scan_page(
        &self,
        owner: Option<Uuid>,
        cursor: Option<Uuid>,
        fetch: i64,
    ) -> Result<Vec<DiaryRecord>> {
        let records = match cursor {
            Some(cursor_id) => {
                let anchor = self
                    .find_by_id(cursor_id)
                    .await?
                    .ok_or_else(|| AppError::Validation("unknown cursor".to_string()))?;
                sqlx::query_as::<_, DiaryRecord>(
                    "SELECT * FROM records \
                     WHERE ($1::uuid IS NULL OR owner = $1) AND (date, id) <= ($2, $3) \
                     ORDER BY date DESC, id DESC LIMIT $4",
                )
                .bind(owner)
                .bind(anchor.date)
                .bind(anchor.id)
                .bind(fetch)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DiaryRecord>(
                    "SELECT * FROM records \
                     WHERE ($1::uuid IS NULL OR owner = $1) \
                     ORDER BY date DESC, id DESC LIMIT $2",
                )
                .bind(owner)
                .bind(fetch)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(records)
    }

    async fn scan_by_owner(&self, owner: Uuid) -> Result<Vec<DiaryRecord>> {
        let records = sqlx::query_as::<_, DiaryRecord>(
            "SELECT * FROM records WHERE owner = $1 ORDER BY date DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

/// In-memory store backing the integration-test harness.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<Uuid, DiaryRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn feed_sorted(&self, owner: Option<Uuid>) -> Vec<DiaryRecord> {
        let mut records: Vec<DiaryRecord> = self
            .records
            .read()
            .unwrap()
            .values()
            .filter(|r| owner.map_or(true, |o| r.owner == o))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        records
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, owner: Uuid, draft: RecordDraft) -> Result<DiaryRecord> {
        let record = DiaryRecord {
            id: Uuid::new_v4(),
            owner,
            date: draft.date,
            time_spent: draft.time_spent,
            language: draft.language,
            rating: draft.rating,
            description: draft.description,
        };
        self.records
            .write()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DiaryRecord>> {
        Ok(self.records.read().unwrap().get(&id).cloned())
    }

    async fn owner_of(&self, id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.records.read().unwrap().get(&id).map(|r| r.owner))
    }

    async fn update_where(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: RecordPatch,
    ) -> Result<Option<DiaryRecord>> {
        let mut records = self.records.write().unwrap();
        match records.get_mut(&id) {
            Some(record) if record.owner == owner => {
                if let Some(date) = patch.date {
                    record.date = date;
                }
                if let Some(time_spent) = patch.time_spent {
                    record.time_spent = time_spent;
                }
                if let Some(language) = patch.language {
                    record.language = language;
                }
                if let Some(rating) = patch.rating {
                    record.rating = rating;
                }
                if let Some(description) = patch.description {
                    record.description = description;
                }
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_where(&self, id: Uuid, owner: Uuid) -> Result<u64> {
        let mut records = self.records.write().unwrap();
        match records.get(&id) {
            Some(record) if record.owner == owner => {
                records.remove(&id);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn scan_page(
        &self,
        owner: Option<Uuid>,
        cursor: Option<Uuid>,
        fetch: i64,
    ) -> Result<Vec<DiaryRecord>> {
        let records = self.feed_sorted(owner);
        let start = match cursor {
            Some(cursor_id) => records
                .iter()
                .position(|r| r.id == cursor_id)
                .ok_or_else(|| AppError::Validation("unknown cursor".to_string()))?,
            None => 0,
        };
        Ok(records
            .into_iter()
            .skip(start)
            .take(fetch as usize)
            .collect())
    }

    async fn scan_by_owner(&self, owner: Uuid) -> Result<Vec<DiaryRecord>> {
        Ok(self.feed_sorted(Some(owner)))
    }
}
