use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::extractor::AuthenticatedUser;
use crate::auth::models::Claims;
use crate::error::{AppError, Result};
use crate::records::models::{
    CreateRecordRequest, DiaryRecord, ListQuery, RecordPage, RecordResponse, RecordUser,
    UpdateRecordRequest,
};
use crate::AppState;

fn caller_id(claims: &Claims) -> Result<Uuid> {
    Uuid::parse_str(&claims.sub).map_err(|_| {
        tracing::warn!(sub = %claims.sub, "Invalid user ID in token");
        AppError::Validation("Invalid user ID".to_string())
    })
}

/// Attach owner info to feed rows. Owners deleted since the scan simply get
/// no user block.
async fn with_users(state: &AppState, records: Vec<DiaryRecord>) -> Result<Vec<RecordResponse>> {
    let mut owners: Vec<Uuid> = records.iter().map(|r| r.owner).collect();
    owners.sort_unstable();
    owners.dedup();

    let mut users: HashMap<Uuid, RecordUser> = HashMap::new();
    for owner in owners {
        if let Some(user) = state.users.find_by_id(owner).await? {
            users.insert(
                owner,
                RecordUser {
                    id: user.id,
                    name: user.name,
                    is_admin: user.is_admin,
                },
            );
        }
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let user = users.get(&record.owner).cloned();
            RecordResponse {
                user,
                ..RecordResponse::from(record)
            }
        })
        .collect())
}

/// Global feed: all users' records, newest practice day first.
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<RecordPage>> {
    let page = state.records.list_all(query.limit, query.cursor).await?;
    Ok(Json(RecordPage {
        records: with_users(&state, page.records).await?,
        next_cursor: page.next_cursor,
    }))
}

pub async fn list_my_records(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<RecordPage>> {
    let caller = caller_id(&claims)?;
    let page = state
        .records
        .list_mine(caller, query.limit, query.cursor)
        .await?;
    Ok(Json(RecordPage {
        records: with_users(&state, page.records).await?,
        next_cursor: page.next_cursor,
    }))
}

pub async fn create_record(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<RecordResponse>)> {
    let caller = caller_id(&claims)?;
    let record = state.records.create(caller, payload.into()).await?;

    tracing::info!(
        record_id = %record.id,
        user_id   = %caller,
        language  = %record.language,
        "Record created"
    );

    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn update_record(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(record_id): Path<Uuid>,
    Json(payload): Json<UpdateRecordRequest>,
) -> Result<Json<RecordResponse>> {
    let caller = caller_id(&claims)?;
    let record = state
        .records
        .update(caller, record_id, payload.into())
        .await?;
    Ok(Json(record.into()))
}

pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(record_id): Path<Uuid>,
) -> Result<StatusCode> {
    let caller = caller_id(&claims)?;
    state.records.delete(caller, record_id).await?;

    tracing::info!(record_id = %record_id, user_id = %caller, "Record deleted");

    Ok(StatusCode::NO_CONTENT)
}
