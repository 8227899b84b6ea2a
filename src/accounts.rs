//! Account directory backed by the `users` collection.

use crate::auth::{
    normalize_email,
    password::{hash_password, verify_password, UNKNOWN_ACCOUNT_DIGEST},
};
use crate::error::{Error, Result};
use crate::store::{Collection, DocumentStore};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const ACCOUNTS_COLLECTION: &str = "users";
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Basic email format check on already-normalized input.
fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn require_credentials(email: &str, password: &str) -> Result<()> {
    if email.is_empty() || password.is_empty() {
        return Err(Error::validation("email and password required"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AccountDirectory {
    accounts: Collection<Account>,
}

impl AccountDirectory {
    #[must_use]
    pub fn new(store: &DocumentStore) -> Self {
        Self {
            accounts: store.collection(ACCOUNTS_COLLECTION),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    /// - [`Error::Validation`] for a missing or malformed email, or a password
    ///   shorter than [`MIN_PASSWORD_LEN`] characters.
    /// - [`Error::DuplicateAccount`] if the email is taken, ignoring case.
    /// - [`Error::Store`] if the collection cannot be read or written.
    #[instrument(skip(self, password))]
    pub async fn create_account(&self, email: &str, password: &str) -> Result<Account> {
        let email = normalize_email(email);
        require_credentials(&email, password)?;
        if !valid_email(&email) {
            return Err(Error::validation("Invalid email format"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        // Cheap pre-check so taken emails don't pay for a hash.
        if self.find_by_email(&email).await?.is_some() {
            return Err(Error::DuplicateAccount);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|err| Error::Internal(anyhow::anyhow!("password hashing task failed: {err}")))??;

        let account = Account {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: Utc::now().timestamp_millis(),
        };

        // Re-check under the write queue; a concurrent signup may have won.
        let created = account.clone();
        self.accounts
            .update(move |accounts| {
                if accounts.iter().any(|a| a.email.eq_ignore_ascii_case(&created.email)) {
                    return Err(Error::DuplicateAccount);
                }
                accounts.push(created);
                Ok(())
            })
            .await?;

        info!("Created account {}", account.id);

        Ok(account)
    }

    /// Check credentials and return the matching account.
    ///
    /// Unknown emails and wrong passwords fail the same way.
    ///
    /// # Errors
    /// - [`Error::Validation`] if email or password is missing.
    /// - [`Error::InvalidCredentials`] if the account is unknown or the password is wrong.
    /// - [`Error::Store`] if the collection cannot be read.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account> {
        let email = normalize_email(email);
        require_credentials(&email, password)?;

        let account = self.find_by_email(&email).await?;

        // Unknown emails still pay for a full Argon2 verification.
        let password = password.to_string();
        let digest = account.as_ref().map_or_else(
            || UNKNOWN_ACCOUNT_DIGEST.to_string(),
            |account| account.password_hash.clone(),
        );
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &digest))
            .await
            .map_err(|err| {
                Error::Internal(anyhow::anyhow!("password verification task failed: {err}"))
            })?;

        match account {
            Some(account) if verified => Ok(account),
            Some(account) => {
                debug!("Login with wrong password for {}", account.id);
                Err(Error::InvalidCredentials)
            }
            None => {
                debug!("Login for unknown email");
                Err(Error::InvalidCredentials)
            }
        }
    }

    /// # Errors
    /// Returns [`Error::Store`] if the collection cannot be read.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let accounts = self.accounts.load().await?;
        Ok(accounts.into_iter().find(|account| account.id == id))
    }

    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.load().await?;
        Ok(accounts
            .into_iter()
            .find(|account| account.email.eq_ignore_ascii_case(email_normalized)))
    }
}
