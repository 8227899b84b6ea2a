//! Signup, login and current-account endpoints.

use super::{extract_bearer_token, ApiError, ErrorBody};
use crate::{accounts::AccountDirectory, auth::AuthorizationGate, error::Error};
use axum::{extract::Extension, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: i64,
    pub is_admin: bool,
}

fn credentials(payload: Option<Json<Credentials>>) -> Result<Credentials, ApiError> {
    payload
        .map(|Json(credentials)| credentials)
        .ok_or_else(|| Error::validation("email and password required").into())
}

#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = Credentials,
    responses(
        (status = 200, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid email or password", body = ErrorBody),
        (status = 409, description = "Email already exists", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn signup(
    accounts: Extension<Arc<AccountDirectory>>,
    gate: Extension<Arc<AuthorizationGate>>,
    payload: Option<Json<Credentials>>,
) -> Result<Json<TokenResponse>, ApiError> {
    let credentials = credentials(payload)?;
    let account = accounts
        .create_account(&credentials.email, &credentials.password)
        .await?;
    let token = gate.tokens().issue(account.id, &account.email)?;
    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    accounts: Extension<Arc<AccountDirectory>>,
    gate: Extension<Arc<AuthorizationGate>>,
    payload: Option<Json<Credentials>>,
) -> Result<Json<TokenResponse>, ApiError> {
    let credentials = credentials(payload)?;
    let account = accounts
        .authenticate(&credentials.email, &credentials.password)
        .await?;
    let token = gate.tokens().issue(account.id, &account.email)?;
    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current account", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Account no longer exists", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    accounts: Extension<Arc<AccountDirectory>>,
    gate: Extension<Arc<AuthorizationGate>>,
) -> Result<Json<MeResponse>, ApiError> {
    let principal = gate.resolve_identity(extract_bearer_token(&headers).as_deref())?;
    let account = accounts
        .find_by_id(principal.user_id)
        .await?
        .ok_or(Error::NotFound)?;

    Ok(Json(MeResponse {
        id: account.id,
        is_admin: gate.is_admin(&account.email),
        email: account.email,
        created_at: account.created_at,
    }))
}
