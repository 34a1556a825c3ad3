use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{
    extractor::AuthenticatedUser,
    models::{
        CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest, User, UserListQuery,
        UserPage, UserResponse,
    },
    security::{create_jwt, hash_password, verify_password},
};
use crate::error::{AppError, Result};
use crate::pagination;
use crate::AppState;

const USER_LIST_DEFAULT_LIMIT: i64 = 50;

/// Extract the real client IP from proxy-forwarded headers since we are
/// running behind nginx in prod.
fn extract_client_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = headers.get("X-Real-IP").and_then(|v| v.to_str().ok()) {
        return ip.to_string();
    }
    if let Some(fwd) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
        if let Some(first) = fwd.split(',').next() {
            return first.trim().to_string();
        }
    }
    "unknown".to_string()
}

// 3-15 chars, letters, numbers, - and _
fn validate_username(name: &str) -> Result<()> {
    let ok = (3..=15).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        return Err(AppError::Validation(
            "Username must be 3-15 characters of letters, numbers, - and _".to_string(),
        ));
    }
    Ok(())
}

// at least 6 chars, no whitespace
fn validate_user_password(password: &str) -> Result<()> {
    if password.len() < 6 || password.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Password must be at least 6 characters and contain no whitespace".to_string(),
        ));
    }
    Ok(())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let client_ip = extract_client_ip(&headers);

    let user = state
        .users
        .find_by_name(&payload.name)
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                name = %payload.name,
                ip   = %client_ip,
                "Failed login attempt - user not found"
            );
            AppError::Unauthorized("Invalid credentials".to_string())
        })?;

    let valid = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification error: {e}")))?;

    if !valid {
        tracing::warn!(
            user_id = %user.id,
            name    = %user.name,
            ip      = %client_ip,
            "Failed login attempt - wrong password"
        );
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = create_jwt(
        &user.id.to_string(),
        &user.name,
        user.is_admin,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )
    .map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "JWT generation failed");
        AppError::Internal(format!("Token generation error: {e}"))
    })?;

    tracing::info!(
        user_id = %user.id,
        name    = %user.name,
        admin   = user.is_admin,
        ip      = %client_ip,
        "Successful login"
    );

    Ok(Json(LoginResponse { token }))
}

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<UserResponse>> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        tracing::warn!(sub = %claims.sub, "get_me - invalid user ID in token");
        AppError::Validation("Invalid user ID".to_string())
    })?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserPage>> {
    let limit = pagination::resolve_limit(query.limit, USER_LIST_DEFAULT_LIMIT)?;
    let users = state.users.scan_page(query.cursor, limit + 1).await?;
    let (users, next_cursor) = pagination::split_page(users, limit, |u| u.id);

    Ok(Json(UserPage {
        items: users.into_iter().map(UserResponse::from).collect(),
        next_cursor,
    }))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    validate_username(&payload.username)?;
    validate_user_password(&payload.password)?;

    if state.users.find_by_name(&payload.username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed during user creation");
        AppError::Internal(format!("Password hashing error: {e}"))
    })?;

    let user = state
        .users
        .insert(User {
            id: Uuid::new_v4(),
            name: payload.username,
            password_hash,
            is_admin: false,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(user_id = %user.id, name = %user.name, "New user created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let mut user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(name) = payload.name {
        validate_username(&name)?;
        if name != user.name && state.users.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        user.name = name;
    }

    if let Some(is_admin) = payload.is_admin {
        if is_admin != user.is_admin {
            tracing::info!(
                user_id = %user_id,
                admin   = is_admin,
                "User admin flag updated"
            );
        }
        user.is_admin = is_admin;
    }

    if let Some(password) = payload.password {
        validate_user_password(&password)?;
        user.password_hash = hash_password(&password).map_err(|e| {
            tracing::error!(error = %e, user_id = %user_id, "Password hashing failed during update");
            AppError::Internal(format!("Password hashing error: {e}"))
        })?;
    }

    let updated_user = state.users.update(&user).await?.ok_or(AppError::NotFound)?;

    tracing::info!(user_id = %user_id, name = %updated_user.name, "User updated");

    Ok(Json(updated_user.into()))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode> {
    match state.users.delete(user_id).await? {
        0 => Err(AppError::NotFound),
        1 => {
            tracing::info!(user_id = %user_id, "User deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        n => Err(AppError::Invariant(format!(
            "deleting user {user_id} removed {n} rows"
        ))),
    }
}
