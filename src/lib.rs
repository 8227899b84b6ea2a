//! # ScalperBlock (store submission and moderation)
//!
//! Accounts sign up with an email and password, submit "stores", and a single
//! configured administrator approves or rejects them.
//!
//! ## Persistence
//!
//! There is no database. Each collection (`users`, `stores`) is one JSON array
//! on disk, replaced atomically on every write. Writes to a collection are
//! serialized through a per-collection FIFO queue; read-modify-write updates
//! hold that queue for their whole duration so concurrent requests never lose
//! each other's changes.
//!
//! ## Authentication
//!
//! Passwords are hashed with Argon2id. Logins return a stateless HS256 bearer
//! token valid for 7 days; there is no server-side revocation.
//!
//! ## Moderation
//!
//! Records start `pending` and only the administrator (matched by email,
//! case-insensitively) may move them to `approved` or `rejected`. Owning a
//! record grants no moderation rights.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod cli;
pub mod error;
pub mod records;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
