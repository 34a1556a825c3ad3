//! External per-user record API, mounted without session auth.
//!
//! Every handler re-validates the owner id from the path before touching the
//! explicit-owner service tier: the user must exist, and for operations on an
//! existing record the record must belong to that user. Both checks fail as
//! a plain 404, so probing for other users' records reveals nothing.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::records::csv;
use crate::records::models::{ApiRecord, ApiRecordInput, ApiRecordReplace, RecordDraft};
use crate::AppState;

async fn ensure_user(state: &AppState, user_id: Uuid) -> Result<()> {
    if state.users.exists(user_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

async fn ensure_owned(state: &AppState, user_id: Uuid, record_id: Uuid) -> Result<()> {
    if state.records.belongs_to_owner(record_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

fn parse_wire_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Date must be formatted YYYY-MM-DD".to_string()))
}

impl ApiRecordInput {
    fn into_draft(self) -> Result<RecordDraft> {
        Ok(RecordDraft {
            date: parse_wire_date(&self.date)?,
            time_spent: self.time_spent,
            language: self.programming_language,
            rating: self.rating,
            description: self.description,
        })
    }
}

impl ApiRecordReplace {
    fn into_draft(self) -> Result<RecordDraft> {
        Ok(RecordDraft {
            date: parse_wire_date(&self.date)?,
            time_spent: self.time_spent,
            language: self.programming_language,
            rating: self.rating,
            description: self.description,
        })
    }
}

pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ApiRecord>>> {
    ensure_user(&state, user_id).await?;
    let records = state.records.list_for_owner(user_id).await?;
    Ok(Json(records.into_iter().map(ApiRecord::from).collect()))
}

pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ApiRecordInput>,
) -> Result<(StatusCode, Json<ApiRecord>)> {
    ensure_user(&state, user_id).await?;
    let record = state
        .records
        .create_for(user_id, payload.into_draft()?)
        .await?;

    tracing::info!(
        record_id = %record.id,
        user_id   = %user_id,
        "Record created via external API"
    );

    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path((user_id, record_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiRecord>> {
    ensure_user(&state, user_id).await?;
    ensure_owned(&state, user_id, record_id).await?;
    let record = state
        .records
        .get_by_id(record_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(record.into()))
}

pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path((user_id, record_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ApiRecordReplace>,
) -> Result<Json<ApiRecord>> {
    ensure_user(&state, user_id).await?;
    ensure_owned(&state, user_id, record_id).await?;
    let record = state
        .records
        .update_for(user_id, record_id, payload.into_draft()?)
        .await?;
    Ok(Json(record.into()))
}

pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path((user_id, record_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    ensure_user(&state, user_id).await?;
    ensure_owned(&state, user_id, record_id).await?;
    state.records.delete_for(user_id, record_id).await?;

    tracing::info!(
        record_id = %record_id,
        user_id   = %user_id,
        "Record deleted via external API"
    );

    Ok(StatusCode::OK)
}

pub async fn export_records(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Response> {
    ensure_user(&state, user_id).await?;
    let records = state.records.list_for_owner(user_id).await?;
    let body = csv::render(&records);

    let filename = format!(
        "{user_id}-{}.csv",
        Local::now().date_naive().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn import_records(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode> {
    ensure_user(&state, user_id).await?;
    Ok(StatusCode::NOT_IMPLEMENTED)
}
