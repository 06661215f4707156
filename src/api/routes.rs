use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = usize::try_from(state.config.max_request_body).unwrap_or(usize::MAX);

    Router::new()
        // Files
        .route("/files", get(handlers::list_files))
        .route(
            "/files",
            post(handlers::create_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/files/:id",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        // Identity
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/whoami", get(handlers::whoami))
        // Roles
        .route("/roles", get(handlers::list_all_roles))
        .route("/roles/:identity", get(handlers::roles_of))
        .route(
            "/roles/:identity/:role",
            put(handlers::grant_role).delete(handlers::revoke_role),
        )
        // Runtime config
        .route(
            "/config",
            get(handlers::get_config).patch(handlers::update_config),
        )
        .route("/config/reset", post(handlers::reset_config))
        // Admin
        .route("/admin/wipe", post(handlers::wipe_all))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
