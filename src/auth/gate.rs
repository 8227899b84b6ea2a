//! Request identity resolution and the admin check.

use super::{normalize_email, AuthConfig, Principal, TokenService};
use crate::error::{Error, Result};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct AuthorizationGate {
    tokens: TokenService,
    admin_email: Option<String>,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            tokens: TokenService::new(
                config.token_secret().clone(),
                config.token_ttl_seconds(),
            ),
            admin_email: config.admin_email().map(str::to_string),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Resolve a bearer token into the caller's identity.
    ///
    /// # Errors
    /// Returns [`Error::Unauthorized`] if no token was presented or it fails verification.
    pub fn resolve_identity(&self, token: Option<&str>) -> Result<Principal> {
        let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
            debug!("No bearer token presented");
            return Err(Error::Unauthorized);
        };
        self.tokens.verify(token).map_err(|_| Error::Unauthorized)
    }

    /// Succeed only for the configured administrator.
    ///
    /// # Errors
    /// Returns [`Error::Forbidden`] when no admin is configured or `email` is not it.
    pub fn require_admin(&self, email: &str) -> Result<()> {
        if self.is_admin(email) {
            Ok(())
        } else {
            warn!("Admin check failed for {email}");
            Err(Error::Forbidden)
        }
    }

    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin == normalize_email(email))
    }
}
