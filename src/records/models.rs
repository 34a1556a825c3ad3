use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DiaryRecord {
    pub id: Uuid,
    pub owner: Uuid,
    pub date: NaiveDate,
    /// ISO 8601 duration, stored as validated.
    pub time_spent: String,
    pub language: String,
    pub rating: i16,
    pub description: String,
}

/// Record fields before an id is assigned.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub date: NaiveDate,
    pub time_spent: String,
    pub language: String,
    pub rating: i16,
    pub description: String,
}

/// Partial update: only present fields change, absent fields are left alone.
/// There is deliberately no owner field - records cannot change hands.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub date: Option<NaiveDate>,
    pub time_spent: Option<String>,
    pub language: Option<String>,
    pub rating: Option<i16>,
    pub description: Option<String>,
}

impl From<RecordDraft> for RecordPatch {
    fn from(draft: RecordDraft) -> Self {
        RecordPatch {
            date: Some(draft.date),
            time_spent: Some(draft.time_spent),
            language: Some(draft.language),
            rating: Some(draft.rating),
            description: Some(draft.description),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub date: NaiveDate,
    pub time_spent: String,
    pub programming_language: String,
    pub rating: i16,
    pub description: String,
}

impl From<CreateRecordRequest> for RecordDraft {
    fn from(req: CreateRecordRequest) -> Self {
        RecordDraft {
            date: req.date,
            time_spent: req.time_spent,
            language: req.programming_language,
            rating: req.rating,
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRecordRequest {
    pub date: Option<NaiveDate>,
    pub time_spent: Option<String>,
    pub programming_language: Option<String>,
    pub rating: Option<i16>,
    pub description: Option<String>,
}

impl From<UpdateRecordRequest> for RecordPatch {
    fn from(req: UpdateRecordRequest) -> Self {
        RecordPatch {
            date: req.date,
            time_spent: req.time_spent,
            language: req.programming_language,
            rating: req.rating,
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub cursor: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUser {
    pub id: Uuid,
    pub name: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub time_spent: String,
    pub programming_language: String,
    pub rating: i16,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<RecordUser>,
}

impl From<DiaryRecord> for RecordResponse {
    fn from(record: DiaryRecord) -> Self {
        RecordResponse {
            id: record.id,
            owner_id: record.owner,
            date: record.date,
            time_spent: record.time_spent,
            programming_language: record.language,
            rating: record.rating,
            description: record.description,
            user: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub records: Vec<RecordResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Uuid>,
}

/// Record as serialized on the external REST API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiRecord {
    pub id: Uuid,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "time-spent")]
    pub time_spent: String,
    #[serde(rename = "programming-language")]
    pub programming_language: String,
    pub rating: i16,
    pub description: String,
}

impl From<DiaryRecord> for ApiRecord {
    fn from(record: DiaryRecord) -> Self {
        ApiRecord {
            id: record.id,
            date: record.date.format("%Y-%m-%d").to_string(),
            time_spent: record.time_spent,
            programming_language: record.language,
            rating: record.rating,
            description: record.description,
        }
    }
}

/// POST body on the external API: a record without an id.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiRecordInput {
    pub date: String,
    #[serde(rename = "time-spent")]
    pub time_spent: String,
    #[serde(rename = "programming-language")]
    pub programming_language: String,
    pub rating: i16,
    pub description: String,
}

/// PUT body on the external API: the full record. The id is required by the
/// wire contract but the path parameter is authoritative.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiRecordReplace {
    pub id: Uuid,
    pub date: String,
    #[serde(rename = "time-spent")]
    pub time_spent: String,
    #[serde(rename = "programming-language")]
    pub programming_language: String,
    pub rating: i16,
    pub description: String,
}
