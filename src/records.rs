//! Store record registry and its moderation state machine.
//!
//! Records start `pending`. The administrator moves them to `approved` or
//! `rejected`; both are terminal. Setting a record to the status it already
//! has is accepted and only refreshes `updatedAt`.

use crate::auth::{AuthorizationGate, Principal};
use crate::error::{Error, Result};
use crate::store::{Collection, DocumentStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

pub const RECORDS_COLLECTION: &str = "stores";
pub const MIN_NAME_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Approved,
    Rejected,
}

impl RecordStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == Self::Pending || self == next
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(Error::validation("Invalid status")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: RecordStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct RecordRegistry {
    records: Collection<StoreRecord>,
    gate: Arc<AuthorizationGate>,
}

impl RecordRegistry {
    #[must_use]
    pub fn new(store: &DocumentStore, gate: Arc<AuthorizationGate>) -> Self {
        Self {
            records: store.collection(RECORDS_COLLECTION),
            gate,
        }
    }

    /// Submit a new record owned by `owner_id`; it starts `pending`.
    ///
    /// # Errors
    /// - [`Error::Validation`] if the trimmed name is shorter than [`MIN_NAME_LEN`].
    /// - [`Error::Store`] if the collection cannot be read or written.
    #[instrument(skip(self, description))]
    pub async fn submit(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<StoreRecord> {
        let name = name.trim();
        if name.chars().count() < MIN_NAME_LEN {
            return Err(Error::validation(format!(
                "Store name required (min {MIN_NAME_LEN} chars)"
            )));
        }

        let record = StoreRecord {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            description: description.map(str::trim).unwrap_or_default().to_string(),
            status: RecordStatus::Pending,
            created_at: Utc::now().timestamp_millis(),
            updated_at: None,
        };

        let stored = record.clone();
        self.records
            .update(move |records| {
                records.push(stored);
                Ok(())
            })
            .await?;

        info!("Store {} submitted by {}", record.id, owner_id);

        Ok(record)
    }

    /// Records owned by `owner_id`, in insertion order.
    ///
    /// # Errors
    /// Returns [`Error::Store`] if the collection cannot be read.
    pub async fn list_owned_by(&self, owner_id: Uuid) -> Result<Vec<StoreRecord>> {
        self.filtered(|record| record.owner_id == owner_id).await
    }

    /// # Errors
    /// Returns [`Error::Store`] if the collection cannot be read.
    pub async fn list_pending(&self) -> Result<Vec<StoreRecord>> {
        self.filtered(|record| record.status == RecordStatus::Pending)
            .await
    }

    /// # Errors
    /// Returns [`Error::Store`] if the collection cannot be read.
    pub async fn list_all(&self) -> Result<Vec<StoreRecord>> {
        Ok(self.records.load().await?)
    }

    /// Moderate a record. Only the administrator may do this; owners cannot.
    ///
    /// # Errors
    /// - [`Error::Forbidden`] if `requester` is not the administrator.
    /// - [`Error::Validation`] for an unknown status or a transition out of a
    ///   terminal status.
    /// - [`Error::NotFound`] if no record has `record_id`.
    /// - [`Error::Store`] if the collection cannot be read or written.
    #[instrument(skip(self, requester), fields(requester = %requester.user_id))]
    pub async fn set_status(
        &self,
        record_id: Uuid,
        new_status: &str,
        requester: &Principal,
    ) -> Result<StoreRecord> {
        self.gate.require_admin(&requester.email)?;
        let status: RecordStatus = new_status.parse()?;

        let updated = self
            .records
            .update(move |records| {
                let record = records
                    .iter_mut()
                    .find(|record| record.id == record_id)
                    .ok_or(Error::NotFound)?;
                if !record.status.can_transition_to(status) {
                    return Err(Error::validation(format!(
                        "Cannot change status from {} to {}",
                        record.status, status
                    )));
                }
                record.status = status;
                record.updated_at = Some(Utc::now().timestamp_millis());
                Ok(record.clone())
            })
            .await?;

        info!("Store {} is now {}", updated.id, updated.status);

        Ok(updated)
    }

    async fn filtered<F>(&self, keep: F) -> Result<Vec<StoreRecord>>
    where
        F: Fn(&StoreRecord) -> bool,
    {
        let mut records = self.records.load().await?;
        records.retain(keep);
        Ok(records)
    }
}
