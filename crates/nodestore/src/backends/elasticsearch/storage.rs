//! NodeStorage implementation for Elasticsearch.
//!
//! Writes target the partition of the current day. Every other operation only
//! knows the id, so it first locates the owning partition through the alias:
//!
//! 1. a direct get through the alias, loading no fields, which names the
//!    concrete index holding the document;
//! 2. if the store refuses to route that get (an alias spanning several
//!    indices cannot serve a get by id), a term query on `_id` across the
//!    alias, accepted only when it matches exactly one document.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::codec::{CodecError, decode_node_data, encode_node_data};
use crate::core::NodeStorage;
use crate::error::{BackendError, StorageError, StorageResult, ValidationError};

use super::backend::{BACKEND_NAME, ElasticNodeStorage};
use super::client::DocumentStoreError;

/// Stored field holding the encoded payload.
pub const DATA_FIELD: &str = "data";

/// Stored field holding the write time.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// The document written for each node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// `base64(zlib(payload))`.
    pub data: String,
    /// Write time, ISO-8601 in UTC.
    pub timestamp: String,
}

impl NodeDocument {
    /// Encodes a payload written at `now`.
    pub fn new(payload: &[u8], now: DateTime<Utc>) -> Self {
        Self {
            data: encode_node_data(payload),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, false),
        }
    }
}

/// Where the document for an id lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Location {
    /// Exactly one partition holds the id.
    Owned(String),
    /// No partition holds the id.
    Absent,
    /// Several partitions hold the id.
    Ambiguous(u64),
    /// The fallback search failed.
    Unroutable(String),
}

/// Result of a read before it is collapsed to `Option<Vec<u8>>`.
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    Found(Vec<u8>),
    NotFound,
    Unrouted(String),
    MissingData { index: String },
    Corrupt { index: String, error: CodecError },
    StoreError { index: Option<String>, error: DocumentStoreError },
}

impl ReadOutcome {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ReadOutcome::Found(_) => "found",
            ReadOutcome::NotFound => "not_found",
            ReadOutcome::Unrouted(_) => "unrouted",
            ReadOutcome::MissingData { .. } => "missing_data",
            ReadOutcome::Corrupt { .. } => "corrupt",
            ReadOutcome::StoreError { .. } => "store_error",
        }
    }

    /// Absent, unroutable and field-less documents read as `Ok(None)`.
    pub(crate) fn into_result(self, id: &str) -> StorageResult<Option<Vec<u8>>> {
        match self {
            ReadOutcome::Found(bytes) => Ok(Some(bytes)),
            ReadOutcome::NotFound | ReadOutcome::Unrouted(_) | ReadOutcome::MissingData { .. } => {
                Ok(None)
            }
            ReadOutcome::Corrupt { error, .. } => Err(StorageError::CorruptData(error)),
            ReadOutcome::StoreError { index, error } => Err(BackendError::request(
                BACKEND_NAME,
                "get",
                index.unwrap_or_else(|| id.to_string()),
                error,
            )
            .into()),
        }
    }
}

fn require_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    Ok(())
}

impl ElasticNodeStorage {
    /// Returns the partition index holding `id`, if any.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation` - If `id` is empty
    /// * `StorageError::Backend` - If the direct get failed for a reason other
    ///   than the document being absent or unroutable
    pub async fn locate(&self, id: &str) -> StorageResult<Option<String>> {
        require_id(id)?;
        self.scoped(async {
            match self.resolve(id).await {
                Ok(Location::Owned(index)) => Ok(Some(index)),
                Ok(_) => Ok(None),
                Err(e) => {
                    tracing::error!(doc_id = %id, error = %e, "document.get_index.error");
                    Err(StorageError::from(BackendError::request(
                        BACKEND_NAME,
                        "locate",
                        id,
                        e,
                    )))
                }
            }
        })
        .await
    }

    /// Reads `id` and reports why a payload could not be returned.
    ///
    /// `get_bytes` is this with every error folded into `None`.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation` - If `id` is empty
    /// * `StorageError::CorruptData` - If the stored payload does not decode
    /// * `StorageError::Backend` - If the store failed while locating or
    ///   fetching the document
    pub async fn try_get_bytes(&self, id: &str) -> StorageResult<Option<Vec<u8>>> {
        require_id(id)?;
        self.scoped(async {
            let outcome = self.read(id).await;
            self.report_read(id, &outcome);
            outcome.into_result(id)
        })
        .await
    }

    pub(crate) async fn resolve(&self, id: &str) -> Result<Location, DocumentStoreError> {
        let alias = self.config.alias_name.as_str();
        match self.client.get_document(alias, id, &[]).await {
            Ok(doc) => Ok(Location::Owned(doc.index)),
            Err(DocumentStoreError::NotFound) => Ok(Location::Absent),
            Err(DocumentStoreError::BadRequest(reason)) => {
                tracing::debug!(doc_id = %id, reason = %reason, "document.get_index.fallback");
                Ok(self.resolve_by_search(id).await)
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_by_search(&self, id: &str) -> Location {
        let alias = self.config.alias_name.as_str();
        let body = json!({
            "query": { "term": { "_id": id } },
            "size": 1,
            "_source": false
        });

        match self.client.search(alias, body).await {
            Ok(hits) if hits.total == 1 => hits
                .hits
                .into_iter()
                .next()
                .map(|hit| Location::Owned(hit.index))
                .unwrap_or(Location::Absent),
            Ok(hits) if hits.total == 0 => Location::Absent,
            Ok(hits) => {
                tracing::warn!(
                    doc_id = %id,
                    matches = hits.total,
                    error = "id found in more than one partition",
                    "document.get_index.error"
                );
                Location::Ambiguous(hits.total)
            }
            Err(DocumentStoreError::NotFound) => Location::Absent,
            Err(e) => {
                tracing::warn!(doc_id = %id, error = %e, "document.get_index.error");
                Location::Unroutable(e.to_string())
            }
        }
    }

    pub(crate) async fn read(&self, id: &str) -> ReadOutcome {
        let index = match self.resolve(id).await {
            Ok(Location::Owned(index)) => index,
            Ok(Location::Absent) => return ReadOutcome::NotFound,
            Ok(Location::Ambiguous(n)) => {
                return ReadOutcome::Unrouted(format!("id found in {} partitions", n));
            }
            Ok(Location::Unroutable(reason)) => return ReadOutcome::Unrouted(reason),
            Err(error) => return ReadOutcome::StoreError { index: None, error },
        };

        match self.client.get_document(&index, id, &[DATA_FIELD]).await {
            Ok(doc) => match doc.first_str(DATA_FIELD) {
                Some(data) => match decode_node_data(data) {
                    Ok(bytes) => ReadOutcome::Found(bytes),
                    Err(error) => ReadOutcome::Corrupt { index, error },
                },
                None => ReadOutcome::MissingData { index },
            },
            // Deleted between locate and fetch.
            Err(DocumentStoreError::NotFound) => ReadOutcome::NotFound,
            Err(error) => ReadOutcome::StoreError {
                index: Some(index),
                error,
            },
        }
    }

    fn report_read(&self, id: &str, outcome: &ReadOutcome) {
        let kind = outcome.kind();
        match outcome {
            ReadOutcome::Found(bytes) => {
                tracing::trace!(doc_id = %id, outcome = kind, size = bytes.len(), "document.get");
            }
            ReadOutcome::NotFound => {
                tracing::warn!(
                    doc_id = %id,
                    outcome = kind,
                    error = "index containing doc_id not found",
                    "document.get.warning"
                );
            }
            ReadOutcome::Unrouted(reason) => {
                tracing::warn!(
                    doc_id = %id,
                    outcome = kind,
                    error = %reason,
                    "document.get.warning"
                );
            }
            ReadOutcome::MissingData { index } => {
                tracing::warn!(
                    doc_id = %id,
                    index = %index,
                    outcome = kind,
                    error = "data field not found in response",
                    "document.get.warning"
                );
            }
            ReadOutcome::Corrupt { index, error } => {
                tracing::error!(
                    doc_id = %id,
                    index = %index,
                    outcome = kind,
                    error = %error,
                    "document.get.error"
                );
            }
            ReadOutcome::StoreError { index, error } => {
                tracing::error!(
                    doc_id = %id,
                    index = index.as_deref().unwrap_or(""),
                    outcome = kind,
                    error = %error,
                    "document.get.error"
                );
            }
        }
    }
}

#[async_trait]
impl NodeStorage for ElasticNodeStorage {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn set_bytes(&self, id: &str, data: &[u8]) -> StorageResult<()> {
        require_id(id)?;
        let now = self.clock.now();
        let document = serde_json::to_value(NodeDocument::new(data, now))?;
        let index = self.scheme.index_for_date(now.date_naive());

        self.scoped(async {
            self.client
                .index_document(&index, id, document, self.config.refresh)
                .await
                .map_err(|e| {
                    tracing::error!(doc_id = %id, index = %index, error = %e, "document.set.error");
                    StorageError::from(BackendError::request(
                        BACKEND_NAME,
                        "index",
                        index.as_str(),
                        e,
                    ))
                })
        })
        .await
    }

    async fn get_bytes(&self, id: &str) -> Option<Vec<u8>> {
        self.try_get_bytes(id).await.ok().flatten()
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        require_id(id)?;
        self.scoped(async {
            let refresh = self.config.refresh;
            let result = match self.resolve(id).await {
                Ok(Location::Owned(index)) => {
                    self.client.delete_document(&index, id, refresh).await
                }
                // Routing is uncertain; let the store find every copy.
                Ok(_) => self
                    .client
                    .delete_by_query(
                        &self.config.alias_name,
                        json!({ "term": { "_id": id } }),
                        refresh,
                    )
                    .await
                    .map(|_| ()),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    tracing::info!(doc_id = %id, "document.delete.executed");
                    Ok(())
                }
                Err(e) if e.is_not_found() || e.is_conflict() => {
                    tracing::debug!(doc_id = %id, reason = %e, "document.delete.skipped");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(doc_id = %id, error = %e, "document.delete.error");
                    Err(StorageError::from(BackendError::request(
                        BACKEND_NAME,
                        "delete",
                        id,
                        e,
                    )))
                }
            }
        })
        .await
    }

    async fn delete_multi(&self, ids: &[String]) -> StorageResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        if ids.iter().any(|id| id.is_empty()) {
            return Err(ValidationError::EmptyId.into());
        }

        self.scoped(async {
            let alias = self.config.alias_name.as_str();
            let query = json!({ "ids": { "values": ids } });

            match self
                .client
                .delete_by_query(alias, query, self.config.refresh)
                .await
            {
                Ok(deleted) => {
                    tracing::info!(
                        docs_to_delete = ids.len(),
                        docs_deleted = deleted,
                        "document.delete_multi.executed"
                    );
                    Ok(())
                }
                Err(e) if e.is_not_found() || e.is_conflict() => {
                    tracing::debug!(
                        docs_to_delete = ids.len(),
                        reason = %e,
                        "document.delete_multi.skipped"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(
                        docs_to_delete = ids.len(),
                        error = %e,
                        "document.delete_multi.error"
                    );
                    Err(StorageError::from(BackendError::request(
                        BACKEND_NAME,
                        "delete_by_query",
                        alias,
                        e,
                    )))
                }
            }
        })
        .await
    }
}
