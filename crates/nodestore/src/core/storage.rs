//! Core node storage trait.
//!
//! This module defines the [`NodeStorage`] trait, the byte-oriented key-value
//! contract a host application programs against. Hosts hold an
//! `Arc<dyn NodeStorage>` and never see which backend sits behind it.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;

/// Byte-oriented key-value storage for nodes.
///
/// Ids are caller-assigned and unique across the whole store.
///
/// # Failure semantics
///
/// Writes and deletes fail loudly: a store failure is returned as an error so
/// the caller knows the change did not happen. Reads fail soft: anything that
/// prevents returning the payload (not found, store errors, corrupt data) is
/// logged by the implementation and reported as `None`.
///
/// Deletes are idempotent. Deleting an id that does not exist succeeds.
///
/// # Example
///
/// ```ignore
/// use elastic_nodestore::core::NodeStorage;
///
/// async fn example(storage: &dyn NodeStorage) -> elastic_nodestore::StorageResult<()> {
///     storage.set_bytes("k1", br#"{"a":1}"#).await?;
///     assert_eq!(storage.get_bytes("k1").await.as_deref(), Some(&br#"{"a":1}"#[..]));
///
///     storage.delete("k1").await?;
///     assert!(storage.get_bytes("k1").await.is_none());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait NodeStorage: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Stores `data` under `id`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation` - If `id` is empty
    /// * `StorageError::Backend` - If the store rejected or failed the write
    async fn set_bytes(&self, id: &str, data: &[u8]) -> StorageResult<()>;

    /// Returns the bytes stored under `id`, or `None`.
    ///
    /// An empty id yields `None`.
    async fn get_bytes(&self, id: &str) -> Option<Vec<u8>>;

    /// Deletes the node stored under `id`.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation` - If `id` is empty
    /// * `StorageError::Backend` - If the store failed for a reason other than
    ///   the node being absent or concurrently modified
    async fn delete(&self, id: &str) -> StorageResult<()>;

    /// Deletes several nodes.
    ///
    /// This is not guaranteed to be atomic and may result in a partial delete.
    /// An empty list is a no-op.
    async fn delete_multi(&self, ids: &[String]) -> StorageResult<()>;

    /// Returns the stored bytes for each id that exists.
    ///
    /// Ids that are absent are left out of the map.
    async fn get_multi_bytes(&self, ids: &[String]) -> HashMap<String, Vec<u8>> {
        let mut out = HashMap::with_capacity(ids.len());
        for id in ids {
            if out.contains_key(id) {
                continue;
            }
            if let Some(bytes) = self.get_bytes(id).await {
                out.insert(id.clone(), bytes);
            }
        }
        out
    }

    /// Stores a JSON node.
    async fn set_value(&self, id: &str, value: &Value) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set_bytes(id, &bytes).await
    }

    /// Returns a JSON node, or `None` if it is absent or not valid JSON.
    async fn get_value(&self, id: &str) -> Option<Value> {
        let bytes = self.get_bytes(id).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    doc_id = %id,
                    error = "payload is not valid JSON",
                    reason = %e,
                    backend = self.backend_name(),
                    "document.get.warning"
                );
                None
            }
        }
    }
}
