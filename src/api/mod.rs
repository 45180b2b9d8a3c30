//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::publisher::UserPublisher;
use crate::service::UserService;
use crate::store::PgUserStore;

pub use routes::create_router;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub users: UserService<PgUserStore>,
    pub publisher: Arc<dyn UserPublisher>,
    /// Deadline applied to each request's store operations
    pub operation_timeout: Duration,
}

impl AppState {
    pub fn new(pool: PgPool, publisher: Arc<dyn UserPublisher>, operation_timeout: Duration) -> Self {
        Self {
            users: UserService::new(PgUserStore::new(pool)),
            publisher,
            operation_timeout,
        }
    }
}

/// Build the full application router: API routes with context and logging
/// middleware, plus the health endpoint.
pub fn build_router(state: AppState) -> Router {
    // Layers run in reverse order of addition: context -> logging -> handler
    let api_routes = create_router()
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::context_middleware,
        ));

    Router::new()
        .route("/_/health", axum::routing::get(routes::health_check))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
