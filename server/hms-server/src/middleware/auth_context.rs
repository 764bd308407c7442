//! Caller identity extraction
//!
//! The token comes from `Authorization: Bearer <token>` or, failing that, the
//! `hms_session` cookie. A missing, malformed, expired or foreign token yields
//! an anonymous caller; the authorization engine turns that into 401.

use async_trait::async_trait;
use auth_rbac::Identity;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::error::ApiError;
use crate::server::HmsServer;

pub const SESSION_COOKIE: &str = "hms_session";

/// The verified caller of a request, if any
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }

    /// The identity, or 401
    pub fn require(&self) -> Result<&Identity, ApiError> {
        self.identity().ok_or_else(ApiError::unauthorized)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<HmsServer> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HmsServer,
    ) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(caller.clone());
        }

        let caller = resolve(&parts.headers, state).await?;
        parts.extensions.insert(caller.clone());
        Ok(caller)
    }
}

async fn resolve(headers: &HeaderMap, state: &HmsServer) -> Result<Caller, ApiError> {
    let Some(token) = bearer_token(headers).or_else(|| session_token(headers)) else {
        return Ok(Caller::anonymous());
    };

    let claims = match state.tokens.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "Rejected session token");
            return Ok(Caller::anonymous());
        }
    };

    let Ok(user_id) = claims.user_id() else {
        return Ok(Caller::anonymous());
    };

    // Role and email come from the stored account, not the token
    let identity = state
        .repos
        .users
        .find_by_id(user_id)
        .await?
        .map(|user| Identity::new(user.id, user.email, user.role, user.name));

    if identity.is_none() {
        debug!(user_id, "Token refers to an unknown account");
    }

    Ok(Caller(identity))
}
