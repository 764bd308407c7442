use auth_rbac::{AuthorizationEngine, Role};
use chrono::{DateTime, Utc};
use database_layer::{NewUser, Repositories};
use logger_redacted::redact_email;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::auth::{PasswordService, RepositoryOwnershipResolver, TokenService};
use crate::config::AppConfig;
use crate::error::ApiError;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct HmsServer {
    pub config: Arc<AppConfig>,
    pub repos: Repositories,
    pub engine: Arc<AuthorizationEngine>,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordService,
    pub started_at: DateTime<Utc>,
}

impl HmsServer {
    /// Wire the authorization engine and token issuer around `repos`
    pub fn new(config: AppConfig, repos: Repositories) -> Self {
        let resolver = RepositoryOwnershipResolver::new(repos.doctors.clone());
        let engine = AuthorizationEngine::new(Arc::new(resolver)).with_lookup_timeout(
            Duration::from_millis(config.auth.ownership_lookup_timeout_ms),
        );
        let tokens = TokenService::new(
            &config.auth.jwt_secret,
            config.auth.issuer.clone(),
            config.auth.token_ttl_secs,
        );

        Self {
            config: Arc::new(config),
            repos,
            engine: Arc::new(engine),
            tokens: Arc::new(tokens),
            passwords: PasswordService::new(),
            started_at: Utc::now(),
        }
    }

    /// Connect the configured store and create the bootstrap admin if needed
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let repos = Repositories::connect(&config.database).await?;
        let server = Self::new(config, repos);
        server.ensure_bootstrap_admin().await?;
        Ok(server)
    }

    /// Create the configured admin account when no account has its email
    pub async fn ensure_bootstrap_admin(&self) -> Result<(), ApiError> {
        let Some(admin) = self.config.auth.bootstrap_admin.as_ref() else {
            return Ok(());
        };

        if self.repos.users.find_by_email(&admin.email).await?.is_some() {
            return Ok(());
        }

        PasswordService::validate_strength(&admin.password)?;
        let password_hash = self.passwords.hash(&admin.password).await?;
        let user = self
            .repos
            .users
            .create(NewUser {
                name: admin.name.clone(),
                email: admin.email.clone(),
                password_hash,
                role: Role::Admin,
            })
            .await?;

        info!(
            user_id = user.id,
            email = %redact_email(&user.email),
            "Bootstrap admin account created"
        );
        Ok(())
    }
}
