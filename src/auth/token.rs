//! Stateless session tokens (HS256 JWT).
//!
//! A token is `base64url(header).base64url(claims).base64url(hmac)`. Nothing is
//! stored server-side: a token is valid while its signature verifies and `exp`
//! lies in the future. There is no revocation; logout is the client discarding
//! the token.

use super::Principal;
use crate::error::{Error, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token lifetime overflows the clock")]
    ExpiryOverflow,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Issues and verifies session tokens with a shared secret.
pub struct TokenService {
    secret: SecretString,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"***")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token for `subject_id` that expires `ttl_seconds` from now.
    ///
    /// # Errors
    /// Returns [`Error::Internal`] if the token cannot be encoded or signed.
    pub fn issue(&self, subject_id: Uuid, email: &str) -> Result<String> {
        self.issue_at(subject_id, email, Utc::now().timestamp())
            .map_err(|err| Error::Internal(anyhow::anyhow!("failed to issue token: {err}")))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Principal> {
        match self.verify_at(token, Utc::now().timestamp()) {
            Ok(claims) => Ok(Principal {
                user_id: claims.sub,
                email: claims.email,
            }),
            Err(err) => {
                debug!("Token rejected: {err}");
                Err(Error::InvalidToken)
            }
        }
    }

    /// Issue a token with an explicit issued-at time.
    ///
    /// # Errors
    /// Returns an error if encoding or signing fails.
    pub fn issue_at(
        &self,
        subject_id: Uuid,
        email: &str,
        now_unix_seconds: i64,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims {
            sub: subject_id,
            email: email.to_string(),
            iat: now_unix_seconds,
            exp: now_unix_seconds
                .checked_add(self.ttl_seconds)
                .ok_or(TokenError::ExpiryOverflow)?,
        };
        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a token at `now_unix_seconds` and return its claims.
    ///
    /// # Errors
    /// Returns an error if the token is malformed, the signature does not
    /// verify, or `exp <= now_unix_seconds`.
    pub fn verify_at(
        &self,
        token: &str,
        now_unix_seconds: i64,
    ) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        if parts.next().is_some() {
            return Err(TokenError::TokenFormat);
        }

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.exp <= now_unix_seconds {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn service(secret: &str) -> TokenService {
        TokenService::new(SecretString::from(secret.to_string()), DEFAULT_TOKEN_TTL_SECONDS)
    }

    #[test]
    fn issued_token_verifies_until_expiry() -> Result<(), TokenError> {
        let tokens = service("test-secret");
        let user_id = Uuid::new_v4();
        let token = tokens.issue_at(user_id, "alice@example.com", NOW)?;

        let claims = tokens.verify_at(&token, NOW)?;
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp, NOW + 7 * 24 * 60 * 60);

        let still_valid = tokens.verify_at(&token, NOW + DEFAULT_TOKEN_TTL_SECONDS - 1);
        assert!(still_valid.is_ok());

        let expired = tokens.verify_at(&token, NOW + DEFAULT_TOKEN_TTL_SECONDS);
        assert!(matches!(expired, Err(TokenError::Expired)));
        Ok(())
    }

    #[test]
    fn rejects_other_secret() -> Result<(), TokenError> {
        let token = service("secret-a").issue_at(Uuid::new_v4(), "a@b.com", NOW)?;
        let result = service("secret-b").verify_at(&token, NOW);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_tampered_claims() -> Result<(), TokenError> {
        let tokens = service("test-secret");
        let token = tokens.issue_at(Uuid::new_v4(), "user@example.com", NOW)?;
        let forged = b64e_json(&SessionClaims {
            sub: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            iat: NOW,
            exp: NOW + 60,
        })?;
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged;

        let result = tokens.verify_at(&parts.join("."), NOW);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_malformed_tokens() {
        let tokens = service("test-secret");
        assert!(matches!(
            tokens.verify_at("only.two", NOW),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            tokens.verify_at("a.b.c.d", NOW),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            tokens.verify_at("!!!.b.c", NOW),
            Err(TokenError::Base64)
        ));
    }

    #[test]
    fn rejects_unsupported_algorithm() -> Result<(), TokenError> {
        let header = b64e_json(&TokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })?;
        let token = format!("{header}.e30.");
        let result = service("test-secret").verify_at(&token, NOW);
        assert!(matches!(result, Err(TokenError::UnsupportedAlg(alg)) if alg == "none"));
        Ok(())
    }

    #[test]
    fn huge_ttl_fails_instead_of_wrapping() {
        let tokens = TokenService::new(SecretString::from("test-secret".to_string()), i64::MAX);
        let result = tokens.issue_at(Uuid::new_v4(), "a@b.com", NOW);
        assert!(matches!(result, Err(TokenError::ExpiryOverflow)));

        let issued = tokens.issue(Uuid::new_v4(), "a@b.com");
        assert!(matches!(issued, Err(Error::Internal(_))));
    }

    #[test]
    fn verify_maps_failures_to_invalid_token() -> Result<(), Error> {
        let tokens = service("test-secret");
        let user_id = Uuid::new_v4();
        let principal = tokens.verify(&tokens.issue(user_id, "a@b.com")?)?;
        assert_eq!(principal.user_id, user_id);

        assert!(matches!(tokens.verify("garbage"), Err(Error::InvalidToken)));
        Ok(())
    }
}
