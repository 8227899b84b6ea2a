//! Flat-file JSON document store.
//!
//! Each named collection is one JSON array on disk (`<root>/<name>.json`) and
//! every write replaces the whole snapshot. Writers of the same collection go
//! through a single FIFO queue (a fair `tokio::sync::Mutex`) that lives as long
//! as the [`DocumentStore`], so at most one physical write per collection is in
//! flight and writes complete in the order they were enqueued. Different
//! collections have independent queues.
//!
//! Readers are not queued: they see the last fully renamed snapshot, which may
//! be stale while a write is in flight but is never partial.

mod atomic;

use crate::error::{Error, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{debug, error, instrument};

/// Registry of collections rooted at one data directory.
#[derive(Debug)]
pub struct DocumentStore {
    root: PathBuf,
    queues: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DocumentStore {
    /// The directory is created lazily by the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            queues: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a typed handle to a collection.
    ///
    /// Handles opened with the same name share one write queue.
    #[must_use]
    pub fn collection<T>(&self, name: &str) -> Collection<T> {
        let queue = {
            let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
            queues
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        Collection {
            name: name.to_string(),
            path: self.root.join(format!("{name}.json")),
            queue,
            _records: PhantomData,
        }
    }
}

/// Typed handle to one collection snapshot.
pub struct Collection<T> {
    name: String,
    path: PathBuf,
    queue: Arc<tokio::sync::Mutex<()>>,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            queue: self.queue.clone(),
            _records: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Return the current snapshot; a collection that was never written is empty.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the snapshot exists but cannot be read or parsed.
    #[instrument(skip(self), fields(collection = %self.name))]
    pub async fn load(&self) -> Result<Vec<T>, StoreError> {
        self.read_snapshot().await
    }

    /// Replace the snapshot with `records`.
    ///
    /// A failed write is reported only to this caller; queued writers proceed.
    ///
    /// # Errors
    /// Returns [`StoreError`] if encoding or the atomic write fails.
    #[instrument(skip(self, records), fields(collection = %self.name, records = records.len()))]
    pub async fn save(&self, records: &[T]) -> Result<(), StoreError> {
        let _turn = self.queue.lock().await;
        self.write_snapshot(records).await
    }

    /// Load, mutate and save while holding this collection's write queue.
    ///
    /// Nothing is written when `mutate` fails, and its error is returned as is.
    ///
    /// # Errors
    /// Returns the error from `mutate`, or [`Error::Store`] if reading or
    /// writing the snapshot fails.
    pub async fn update<R, F>(&self, mutate: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, Error>,
    {
        let _turn = self.queue.lock().await;
        let mut records = self.read_snapshot().await?;
        let output = mutate(&mut records)?;
        self.write_snapshot(&records).await?;
        Ok(output)
    }

    async fn read_snapshot(&self) -> Result<Vec<T>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                error!("Failed to read collection {}: {}", self.name, err);
                return Err(StoreError::Io {
                    collection: self.name.clone(),
                    action: "read",
                    source: err,
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            error!("Collection {} is not a valid JSON array: {}", self.name, err);
            StoreError::Corrupt {
                collection: self.name.clone(),
                source: err,
            }
        })
    }

    async fn write_snapshot(&self, records: &[T]) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(records).map_err(|err| StoreError::Encode {
            collection: self.name.clone(),
            source: err,
        })?;

        atomic::write_atomic(&self.path, &encoded)
            .await
            .map_err(|err| {
                error!("Failed to write collection {}: {}", self.name, err);
                StoreError::Io {
                    collection: self.name.clone(),
                    action: "write",
                    source: err,
                }
            })?;

        debug!(
            "Wrote {} records ({} bytes) to collection {}",
            records.len(),
            encoded.len(),
            self.name
        );

        Ok(())
    }
}
