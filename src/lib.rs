use std::{sync::Arc, time::Duration};

use axum::{
    middleware::from_fn,
    routing::{delete, get, patch},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub mod admin_log;
pub mod config;
pub mod metrics;
pub mod middleware;
pub mod routes;

use admin_log::AdminLogger;
use middleware::{context::request_context_middleware, identity::identity_middleware};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub admin_log: AdminLogger,
}

impl AppState {
    pub fn new(config: config::AppConfig, admin_log: AdminLogger) -> Self {
        Self {
            config: Arc::new(config),
            admin_log,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/admin/users", get(routes::admin::list_users))
        .route(
            "/admin/users/:user_id/role",
            patch(routes::admin::change_user_role),
        )
        .route(
            "/admin/comments/:comment_id",
            delete(routes::admin::delete_comment),
        )
        // Outermost first: identity must run before the context is bound
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(from_fn(identity_middleware))
                .layer(from_fn(request_context_middleware)),
        )
        .with_state(state)
}
