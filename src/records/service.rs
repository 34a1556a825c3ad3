//! Record operations behind two trust tiers.
//!
//! The *session* tier derives the owner from the authenticated caller and is
//! what the protected routes use. The *explicit-owner* tier takes the owner
//! id as an argument and trusts it; it backs the external REST API, whose
//! handlers must prove the owner is real (and, for mutations on an existing
//! record, that the record belongs to that owner via [`RecordService::belongs_to_owner`])
//! before calling in. The session tier is a thin wrapper over the
//! explicit-owner tier, so validation exists exactly once.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::pagination;
use crate::records::duration;
use crate::records::models::{DiaryRecord, RecordDraft, RecordPatch};
use crate::records::store::RecordStore;

/// One page of the record feed, newest practice day first.
#[derive(Debug)]
pub struct Page {
    pub records: Vec<DiaryRecord>,
    pub next_cursor: Option<Uuid>,
}

#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    // --- session tier: owner is the authenticated caller ---

    /// Global feed across all owners.
    pub async fn list_all(&self, limit: Option<i64>, cursor: Option<Uuid>) -> Result<Page> {
        self.page(None, limit, cursor).await
    }

    /// The caller's own records.
    pub async fn list_mine(
        &self,
        caller: Uuid,
        limit: Option<i64>,
        cursor: Option<Uuid>,
    ) -> Result<Page> {
        self.page(Some(caller), limit, cursor).await
    }

    /// Create for the caller. Any owner in the input was discarded before
    /// this point - the draft carries no owner field.
    pub async fn create(&self, caller: Uuid, draft: RecordDraft) -> Result<DiaryRecord> {
        self.create_for(caller, draft).await
    }

    /// Partial update of the caller's record. Editing someone else's record
    /// fails exactly like editing a record that does not exist.
    pub async fn update(&self, caller: Uuid, id: Uuid, patch: RecordPatch) -> Result<DiaryRecord> {
        let patch = validate_patch(patch)?;
        self.store
            .update_where(id, caller, patch)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<()> {
        self.delete_for(caller, id).await
    }

    // --- explicit-owner tier: callers must have validated `owner` ---

    /// True iff the record exists and belongs to `owner`. A missing record
    /// is `false`, not an error. External callers must check this before
    /// any mutating call on an existing record.
    pub async fn belongs_to_owner(&self, record_id: Uuid, owner: Uuid) -> Result<bool> {
        Ok(self.store.owner_of(record_id).await? == Some(owner))
    }

    /// Unscoped read; the boundary confirms ownership separately.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<DiaryRecord>> {
        self.store.find_by_id(id).await
    }

    pub async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<DiaryRecord>> {
        self.store.scan_by_owner(owner).await
    }

    pub async fn create_for(&self, owner: Uuid, draft: RecordDraft) -> Result<DiaryRecord> {
        let draft = validate_draft(draft)?;
        self.store.insert(owner, draft).await
    }

    /// Full replace of the record matching `id AND owner`.
    pub async fn update_for(&self, owner: Uuid, id: Uuid, draft: RecordDraft) -> Result<DiaryRecord> {
        let draft = validate_draft(draft)?;
        self.store
            .update_where(id, owner, draft.into())
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn delete_for(&self, owner: Uuid, id: Uuid) -> Result<()> {
        match self.store.delete_where(id, owner).await? {
            0 => Err(AppError::NotFound),
            1 => Ok(()),
            rows => {
                // ids are unique, so this can only mean the store is broken
                tracing::error!(
                    record_id = %id,
                    owner     = %owner,
                    rows,
                    "Deleted more than one record for a single id"
                );
                Err(AppError::Invariant(format!(
                    "deleting record {id} removed {rows} rows"
                )))
            }
        }
    }

    async fn page(
        &self,
        owner: Option<Uuid>,
        limit: Option<i64>,
        cursor: Option<Uuid>,
    ) -> Result<Page> {
        let limit = pagination::resolve_limit(limit, pagination::DEFAULT_LIMIT)?;
        let rows = self.store.scan_page(owner, cursor, limit + 1).await?;
        let (records, next_cursor) = pagination::split_page(rows, limit, |r| r.id);
        Ok(Page {
            records,
            next_cursor,
        })
    }
}

fn validate_draft(draft: RecordDraft) -> Result<RecordDraft> {
    Ok(RecordDraft {
        date: draft.date,
        time_spent: validate_time_spent(&draft.time_spent)?,
        language: validate_language(&draft.language)?,
        rating: validate_rating(draft.rating)?,
        description: validate_description(&draft.description)?,
    })
}

fn validate_patch(patch: RecordPatch) -> Result<RecordPatch> {
    Ok(RecordPatch {
        date: patch.date,
        time_spent: patch
            .time_spent
            .as_deref()
            .map(validate_time_spent)
            .transpose()?,
        language: patch.language.as_deref().map(validate_language).transpose()?,
        rating: patch.rating.map(validate_rating).transpose()?,
        description: patch
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?,
    })
}

fn validate_language(language: &str) -> Result<String> {
    let language = language.trim();
    if language.is_empty() || language.chars().count() > 30 {
        return Err(AppError::Validation(
            "Programming language must be 1-30 characters".to_string(),
        ));
    }
    Ok(language.to_string())
}

fn validate_description(description: &str) -> Result<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::Validation(
            "Description must not be empty".to_string(),
        ));
    }
    Ok(description.to_string())
}

fn validate_rating(rating: i16) -> Result<i16> {
    if !(0..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 0 and 5".to_string(),
        ));
    }
    Ok(rating)
}

fn validate_time_spent(time_spent: &str) -> Result<String> {
    let time_spent = time_spent.trim();
    match duration::parse(time_spent) {
        Some(parsed) if parsed > Duration::zero() => Ok(time_spent.to_string()),
        Some(_) => Err(AppError::Validation(
            "Time spent must be greater than zero".to_string(),
        )),
        None => Err(AppError::Validation(
            "Time spent must be a valid ISO 8601 duration".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn draft() -> RecordDraft {
        RecordDraft {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            time_spent: "PT1H".to_string(),
            language: "Rust".to_string(),
            rating: 4,
            description: "Learned ownership".to_string(),
        }
    }

    #[test]
    fn drafts_are_trimmed_and_bounded() {
        let validated = validate_draft(RecordDraft {
            language: "  Rust  ".to_string(),
            description: " hard day \n".to_string(),
            ..draft()
        })
        .unwrap();
        assert_eq!(validated.language, "Rust");
        assert_eq!(validated.description, "hard day");
    }

    #[test]
    fn zero_duration_is_rejected() {
        for zero in ["P0D", "PT0S", "PT0H0M0S"] {
            let err = validate_draft(RecordDraft {
                time_spent: zero.to_string(),
                ..draft()
            })
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{zero} passed");
        }
    }

    #[test]
    fn bad_fields_are_rejected() {
        assert!(validate_draft(RecordDraft {
            rating: 6,
            ..draft()
        })
        .is_err());
        assert!(validate_draft(RecordDraft {
            rating: -1,
            ..draft()
        })
        .is_err());
        assert!(validate_draft(RecordDraft {
            language: "x".repeat(31),
            ..draft()
        })
        .is_err());
        assert!(validate_draft(RecordDraft {
            language: "   ".to_string(),
            ..draft()
        })
        .is_err());
        assert!(validate_draft(RecordDraft {
            description: " ".to_string(),
            ..draft()
        })
        .is_err());
        assert!(validate_draft(RecordDraft {
            time_spent: "an hour".to_string(),
            ..draft()
        })
        .is_err());
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let patch = validate_patch(RecordPatch {
            rating: Some(5),
            ..RecordPatch::default()
        })
        .unwrap();
        assert_eq!(patch.rating, Some(5));
        assert!(patch.language.is_none());

        assert!(validate_patch(RecordPatch {
            time_spent: Some("P0D".to_string()),
            ..RecordPatch::default()
        })
        .is_err());
    }

    /// Store stub reporting a multi-row delete, which no healthy store can
    /// produce.
    struct BrokenDeleteStore;

    #[async_trait]
    impl RecordStore for BrokenDeleteStore {
        async fn insert(&self, _owner: Uuid, _draft: RecordDraft) -> Result<DiaryRecord> {
            unreachable!()
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<DiaryRecord>> {
            unreachable!()
        }
        async fn owner_of(&self, _id: Uuid) -> Result<Option<Uuid>> {
            unreachable!()
        }
        async fn update_where(
            &self,
            _id: Uuid,
            _owner: Uuid,
            _patch: RecordPatch,
        ) -> Result<Option<DiaryRecord>> {
            unreachable!()
        }
        async fn delete_where(&self, _id: Uuid, _owner: Uuid) -> Result<u64> {
            Ok(2)
        }
        async fn scan_page(
            &self,
            _owner: Option<Uuid>,
            _cursor: Option<Uuid>,
            _fetch: i64,
        ) -> Result<Vec<DiaryRecord>> {
            unreachable!()
        }
        async fn scan_by_owner(&self, _owner: Uuid) -> Result<Vec<DiaryRecord>> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn multi_row_delete_is_an_invariant_violation() {
        let service = RecordService::new(Arc::new(BrokenDeleteStore));
        let err = service
            .delete_for(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Invariant(_)));
    }
}
