//! HMS Server - HTTP API of the hospital management engine
//!
//! Every entity route authenticates the caller from a bearer token or the
//! `hms_session` cookie and asks the [`auth_rbac::AuthorizationEngine`] for a
//! decision before touching the store.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::*;
pub use server::HmsServer;

use axum::{middleware::from_fn, middleware::from_fn_with_state, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Create the main application router with all routes and middleware
pub fn create_app(server: HmsServer) -> Router {
    let timeout = Duration::from_secs(server.config.server.request_timeout_secs);
    let cors = middleware::create_cors_layer(&server.config.server.cors_origins);

    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(cors)
                .layer(from_fn(middleware::request_timing_middleware))
                .layer(from_fn_with_state(
                    server.clone(),
                    middleware::audit_logging_middleware,
                )),
        )
        .with_state(server)
}
