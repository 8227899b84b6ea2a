//! Error kinds surfaced by the core services.
//!
//! Every failure maps to exactly one variant so the HTTP layer can pick a
//! status code without inspecting messages. Storage failures keep their
//! underlying cause for logs, but their `Display` never includes paths.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("Email already exists")]
    DuplicateAccount,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: admin only")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("storage unavailable")]
    Store(#[from] StoreError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status code for this error kind.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::InvalidCredentials | Self::InvalidToken | Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::DuplicateAccount => 409,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }
}

/// Backing-storage failure for a single collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {action} collection `{collection}`: {source}")]
    Io {
        collection: String,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("collection `{collection}` is corrupt: {source}")]
    Corrupt {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode collection `{collection}`: {source}")]
    Encode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}
