//! Credentials, session tokens and the authorization gate.
//!
//! ## Sessions
//!
//! Sessions are stateless HS256 tokens signed with the configured secret and
//! valid for 7 days by default. They carry the account id (`sub`) and the
//! account email, which is the contact identity used for admin checks.
//!
//! ## Administrator
//!
//! Exactly one administrator exists: the account whose email matches the
//! configured admin email (case-insensitive). It is a configuration value, not
//! a flag stored on accounts. With no admin email configured nobody can
//! moderate.

mod gate;
pub mod password;
pub mod token;

pub use gate::AuthorizationGate;
pub use token::{TokenService, DEFAULT_TOKEN_TTL_SECONDS};

use secrecy::SecretString;
use uuid::Uuid;

/// Identity resolved from a verified session token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    token_ttl_seconds: i64,
    admin_email: Option<String>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            admin_email: None,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    /// Blank values leave the system without an administrator.
    #[must_use]
    pub fn with_admin_email(mut self, email: Option<String>) -> Self {
        self.admin_email = email
            .map(|email| normalize_email(&email))
            .filter(|email| !email.is_empty());
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    pub(crate) fn token_secret(&self) -> &SecretString {
        &self.token_secret
    }
}

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
