pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod pagination;
pub mod records;

pub use config::Config;
pub use database::create_pool;
pub use error::{AppError, Result};

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::security::{admin_middleware, auth_middleware};
use crate::auth::store::UserStore;
use crate::records::service::RecordService;

pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub records: RecordService,
    pub config: Config,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/login", post(auth::handlers::login));

    // protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/me", get(auth::handlers::get_me))
        .route(
            "/records",
            get(records::handlers::list_records).post(records::handlers::create_record),
        )
        .route("/records/mine", get(records::handlers::list_my_records))
        .route(
            "/records/{record_id}",
            patch(records::handlers::update_record).delete(records::handlers::delete_record),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // admin routes (authentication + admin required)
    let admin_routes = Router::new()
        .route(
            "/users",
            get(auth::handlers::list_users).post(auth::handlers::create_user),
        )
        .route(
            "/users/{user_id}",
            patch(auth::handlers::update_user).delete(auth::handlers::delete_user),
        )
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // external record api (no session; handlers re-validate ownership)
    let external_routes = Router::new()
        .route(
            "/users/{user_id}/records",
            get(records::ext_api::list_records).post(records::ext_api::create_record),
        )
        .route(
            "/users/{user_id}/records/{record_id}",
            get(records::ext_api::get_record)
                .put(records::ext_api::update_record)
                .delete(records::ext_api::delete_record),
        )
        .route("/users/{user_id}/export", get(records::ext_api::export_records))
        .route("/users/{user_id}/import", post(records::ext_api::import_records));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .merge(external_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Coding Practice Diary API - v0.1.0"
}
