//! Route definitions for the Wagate HTTP API.
//!
//! Tenant routes are mounted twice: under `/api/{token}` and under `/api`
//! for clients that send the token in the `X-WAGATE-TOKEN` header.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with all routes, threading `AppState` through them.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .merge(health_routes())
        .merge(tenant_routes("/api/{token}"))
        .merge(tenant_routes("/api"))
        .route("/api/{token}", delete(handlers::tenant::delete))
        .route("/ws", get(handlers::ws::ws_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}

/// Per-tenant endpoints under `prefix`.
fn tenant_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(&format!("{prefix}/info"), get(handlers::tenant::info))
        .route(&format!("{prefix}/pair"), post(handlers::tenant::pair))
        .route(&format!("{prefix}/receive"), get(handlers::message::receive))
        .route(
            &format!("{prefix}/message/{{id}}"),
            get(handlers::message::get_message).delete(handlers::message::revoke),
        )
        .route(&format!("{prefix}/send"), post(handlers::message::send))
        .route(
            &format!("{prefix}/webhooks"),
            get(handlers::webhook::list)
                .post(handlers::webhook::add)
                .delete(handlers::webhook::remove),
        )
        .route(
            &format!("{prefix}/webhooks/toggle"),
            post(handlers::webhook::toggle),
        )
}
