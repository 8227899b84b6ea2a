//! Store submission, listing and moderation endpoints.

use super::{extract_bearer_token, ApiError, ErrorBody};
use crate::{
    accounts::AccountDirectory,
    auth::{AuthorizationGate, Principal},
    error::Error,
    records::{RecordRegistry, RecordStatus, StoreRecord},
};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct NewStore {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

fn principal(headers: &HeaderMap, gate: &AuthorizationGate) -> Result<Principal, Error> {
    gate.resolve_identity(extract_bearer_token(headers).as_deref())
}

#[utoipa::path(
    post,
    path = "/api/stores",
    request_body = NewStore,
    responses(
        (status = 201, description = "Store submitted for moderation", body = StoreRecord),
        (status = 400, description = "Store name too short", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "stores"
)]
#[instrument(skip_all)]
pub async fn create(
    headers: HeaderMap,
    accounts: Extension<Arc<AccountDirectory>>,
    registry: Extension<Arc<RecordRegistry>>,
    gate: Extension<Arc<AuthorizationGate>>,
    payload: Option<Json<NewStore>>,
) -> Result<(StatusCode, Json<StoreRecord>), ApiError> {
    let principal = principal(&headers, &gate)?;

    // Owners must be existing accounts at submission time.
    if accounts.find_by_id(principal.user_id).await?.is_none() {
        return Err(Error::Unauthorized.into());
    }

    let new_store = payload.map(|Json(new_store)| new_store).unwrap_or_default();
    let record = registry
        .submit(
            principal.user_id,
            &new_store.name,
            new_store.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/stores",
    responses(
        (status = 200, description = "Every store in submission order", body = [StoreRecord]),
    ),
    tag = "stores"
)]
pub async fn list_all(
    registry: Extension<Arc<RecordRegistry>>,
) -> Result<Json<Vec<StoreRecord>>, ApiError> {
    Ok(Json(registry.list_all().await?))
}

#[utoipa::path(
    get,
    path = "/api/stores/my",
    responses(
        (status = 200, description = "Stores owned by the caller", body = [StoreRecord]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "stores"
)]
pub async fn list_mine(
    headers: HeaderMap,
    registry: Extension<Arc<RecordRegistry>>,
    gate: Extension<Arc<AuthorizationGate>>,
) -> Result<Json<Vec<StoreRecord>>, ApiError> {
    let principal = principal(&headers, &gate)?;
    Ok(Json(registry.list_owned_by(principal.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/stores/pending",
    responses(
        (status = 200, description = "Stores awaiting moderation", body = [StoreRecord]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is not the administrator", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "stores"
)]
pub async fn list_pending(
    headers: HeaderMap,
    registry: Extension<Arc<RecordRegistry>>,
    gate: Extension<Arc<AuthorizationGate>>,
) -> Result<Json<Vec<StoreRecord>>, ApiError> {
    let principal = principal(&headers, &gate)?;
    gate.require_admin(&principal.email)?;
    Ok(Json(registry.list_pending().await?))
}

#[utoipa::path(
    post,
    path = "/api/stores/{id}/status",
    params(("id" = String, Path, description = "Store id")),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Store moderated", body = StoreRecord),
        (status = 400, description = "Invalid status", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is not the administrator", body = ErrorBody),
        (status = 404, description = "Store not found", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "stores"
)]
#[instrument(skip_all, fields(store_id = %id))]
pub async fn set_status(
    Path(id): Path<String>,
    headers: HeaderMap,
    registry: Extension<Arc<RecordRegistry>>,
    gate: Extension<Arc<AuthorizationGate>>,
    payload: Option<Json<StatusUpdate>>,
) -> Result<Json<StoreRecord>, ApiError> {
    let principal = principal(&headers, &gate)?;
    let update = payload.map(|Json(update)| update).unwrap_or_default();

    let Ok(record_id) = Uuid::parse_str(&id) else {
        // Same precedence as a well-formed id that matches nothing.
        gate.require_admin(&principal.email)?;
        update.status.parse::<RecordStatus>()?;
        return Err(Error::NotFound.into());
    };

    let record = registry
        .set_status(record_id, &update.status, &principal)
        .await?;
    Ok(Json(record))
}
