use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use diary_backend::auth::models::User;
use diary_backend::auth::security::hash_password;
use diary_backend::auth::store::{PgUserStore, UserStore};
use diary_backend::records::service::RecordService;
use diary_backend::records::store::PgRecordStore;
use diary_backend::{create_pool, create_router, AppError, AppState, Config};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let _guard = diary_backend::logging::init();

    let config = Config::from_env().expect("missing required environment variables");

    let pool = create_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let records = RecordService::new(Arc::new(PgRecordStore::new(pool)));

    bootstrap_admin(&config, users.as_ref())
        .await
        .expect("failed to bootstrap admin account");

    let state = Arc::new(AppState {
        users,
        records,
        config: config.clone(),
    });
    let app = create_router(state);

    info!("starting server on {}", config.server_address);
    let listener = tokio::net::TcpListener::bind(&config.server_address)
        .await
        .unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// There is no open registration - admins create accounts - so the very
/// first admin has to come from the environment. Only runs against an empty
/// user table.
async fn bootstrap_admin(config: &Config, users: &dyn UserStore) -> Result<(), AppError> {
    let (Some(name), Some(password)) = (
        &config.bootstrap_admin_name,
        &config.bootstrap_admin_password,
    ) else {
        return Ok(());
    };

    if users.count().await? > 0 {
        return Ok(());
    }

    let password_hash = hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hashing error: {e}")))?;

    let admin = users
        .insert(User {
            id: Uuid::new_v4(),
            name: name.clone(),
            password_hash,
            is_admin: true,
            created_at: Utc::now(),
        })
        .await?;

    info!(user_id = %admin.id, name = %admin.name, "Bootstrap admin account created");

    Ok(())
}
