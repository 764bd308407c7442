pub mod auth_context;
pub mod extractors;

pub use auth_context::{Caller, SESSION_COOKIE};
pub use extractors::parse_body;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use logger_redacted::redact_email;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::server::HmsServer;

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        status = response.status().as_u16(),
        "Request processed"
    );

    response
}

/// Audit logging middleware
///
/// Resolves the caller once and stores it in the request extensions, so the
/// handler's `Caller` extractor reuses it. A failed lookup is logged as
/// anonymous and left for the handler's extractor to report.
pub async fn audit_logging_middleware(
    State(server): State<HmsServer>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let caller = match Caller::from_request_parts(&mut parts, &server).await {
        Ok(caller) => caller,
        Err(e) => {
            warn!(error = %e.log_detail(), "Caller lookup failed in audit layer");
            Caller::anonymous()
        }
    };
    let request = Request::from_parts(parts, body);

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let (user, role) = caller.identity().map_or_else(
        || ("anonymous".to_string(), "none"),
        |identity| (redact_email(&identity.email), identity.role.as_str()),
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        user = %user,
        role = role,
        status = response.status().as_u16(),
        timestamp = %chrono::Utc::now().to_rfc3339(),
        "Audit log: Request handled"
    );

    response
}

/// Create CORS layer for the configured origins
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
