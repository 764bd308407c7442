//! Login, logout, account registration and the caller's profile

use auth_rbac::{Identity, Operation, RecordId, ResourceType, Role};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use database_layer::{NewUser, User};
use logger_redacted::redact_email;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::common;
use crate::auth::{AuthError, PasswordService};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{parse_body, Caller, SESSION_COOKIE};
use crate::server::HmsServer;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Fields are optional so a missing one is reported by name
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&Identity> for ProfileResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            role: identity.role,
        }
    }
}

fn session_cookie(server: &HmsServer, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(server.config.auth.secure_cookies)
        .build()
}

/// Verify credentials and open a session
///
/// The token is returned in the body and set as the `hms_session` cookie.
pub async fn login(
    State(server): State<HmsServer>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let request = parse_body(payload)?;

    let Some(user) = server.repos.users.find_by_email(request.email.trim()).await? else {
        warn!(email = %redact_email(&request.email), "Login failed: unknown account");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !server
        .passwords
        .verify(&request.password, &user.password_hash)
        .await?
    {
        warn!(user_id = user.id, "Login failed: wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = server.tokens.issue(&user)?;
    info!(
        user_id = user.id,
        email = %redact_email(&user.email),
        role = %user.role,
        "Login succeeded"
    );

    let jar = jar.add(session_cookie(&server, issued.token.clone()));
    Ok((
        jar,
        Json(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        }),
    ))
}

/// Clear the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

/// Create a login account; admin only
pub async fn register(
    State(server): State<HmsServer>,
    caller: Caller,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    common::authorize(&server, &caller, Operation::Create, ResourceType::User, None).await?;

    let request = parse_body(payload)?;
    let (Some(name), Some(email), Some(password), Some(role)) = (
        request.name.filter(|v| !v.trim().is_empty()),
        request.email.filter(|v| !v.trim().is_empty()),
        request.password.filter(|v| !v.is_empty()),
        request.role.filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(ApiError::validation(
            "name, email, password and role are required",
        ));
    };

    let role: Role = role
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid role: {role}")))?;
    PasswordService::validate_strength(&password)?;

    let email = email.trim().to_string();
    if server.repos.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let new_user = NewUser {
        name: name.trim().to_string(),
        email,
        password_hash: server.passwords.hash(&password).await?,
        role,
    };
    new_user.validate()?;

    let user = server.repos.users.create(new_user).await?;
    info!(
        user_id = user.id,
        email = %redact_email(&user.email),
        role = %user.role,
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// The caller's own profile
pub async fn me(caller: Caller) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(ProfileResponse::from(caller.require()?)))
}
