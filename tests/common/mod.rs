use axum::body::Body;
use axum::http::{Request, Response};
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use diary_backend::auth::models::User;
use diary_backend::auth::security::{create_jwt, hash_password};
use diary_backend::auth::store::{MemoryUserStore, UserStore};
use diary_backend::records::service::RecordService;
use diary_backend::records::store::MemoryRecordStore;
use diary_backend::{create_router, AppState, Config};

#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
}

pub fn spawn_app() -> TestApp {
    let config = Config {
        database_url: "postgres://unused-in-tests".to_string(),
        jwt_secret: "test_secret".to_string(),
        jwt_expiry_hours: 24,
        server_address: "127.0.0.1:0".to_string(),
        bootstrap_admin_name: None,
        bootstrap_admin_password: None,
    };

    let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
    let records = RecordService::new(Arc::new(MemoryRecordStore::new()));

    let state = Arc::new(AppState {
        users,
        records,
        config,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

/// Seed a user that will authenticate via [`token_for`], skipping the cost
/// of a real bcrypt hash. Use [`seed_login_user`] when the test exercises
/// the login endpoint itself.
#[allow(dead_code)]
pub async fn seed_user(app: &TestApp, name: &str, is_admin: bool) -> Uuid {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        password_hash: "not-a-usable-hash".to_string(),
        is_admin,
        created_at: Utc::now(),
    };
    app.state.users.insert(user.clone()).await.unwrap();
    user.id
}

#[allow(dead_code)]
pub async fn seed_login_user(app: &TestApp, name: &str, password: &str, is_admin: bool) -> Uuid {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        password_hash: hash_password(password).unwrap(),
        is_admin,
        created_at: Utc::now(),
    };
    app.state.users.insert(user.clone()).await.unwrap();
    user.id
}

#[allow(dead_code)]
pub fn token_for(app: &TestApp, user_id: Uuid, name: &str, admin: bool) -> String {
    create_jwt(
        &user_id.to_string(),
        name,
        admin,
        &app.state.config.jwt_secret,
        app.state.config.jwt_expiry_hours,
    )
    .unwrap()
}

#[allow(dead_code)]
pub async fn request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.clone().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
