//! Document store client seam.
//!
//! [`DocumentStoreApi`] lists the store operations the node store consumes,
//! reduced to the parts of each response it actually reads. The production
//! implementation talks to Elasticsearch over HTTP; tests substitute an
//! in-memory store.

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Stored field selector meaning "no stored fields".
pub const NO_STORED_FIELDS: &str = "_none_";

/// A document returned by a get or a search hit.
#[derive(Debug, Clone, Default)]
pub struct StoredDocument {
    /// Concrete index holding the document (never an alias).
    pub index: String,
    /// Document id.
    pub id: String,
    /// Requested stored fields; every value is an array.
    pub fields: Map<String, Value>,
}

impl StoredDocument {
    /// Returns the first string value of a stored field.
    pub fn first_str(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.as_array())
            .and_then(|values| values.first())
            .and_then(|v| v.as_str())
    }
}

/// Hits of a search request.
#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    /// Total number of matching documents.
    pub total: u64,
    /// Returned hits (at most the requested size).
    pub hits: Vec<StoredDocument>,
}

/// Errors reported by the document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentStoreError {
    /// The document, index, alias or template does not exist.
    #[error("not found")]
    NotFound,

    /// Concurrent modification, or a create-only request hit an existing entity.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store refused the request as malformed or unsupported.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The store could not be reached or is overloaded.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Any other failure.
    #[error("{0}")]
    Internal(String),
}

impl DocumentStoreError {
    /// Maps an HTTP error status and response body to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => DocumentStoreError::NotFound,
            409 => DocumentStoreError::Conflict(body),
            400 if body.contains("resource_already_exists_exception")
                || body.contains("already exists") =>
            {
                DocumentStoreError::Conflict(body)
            }
            400 => DocumentStoreError::BadRequest(body),
            429 | 500..=599 => {
                DocumentStoreError::Unavailable(format!("status {}: {}", status, body))
            }
            _ => DocumentStoreError::Internal(format!("status {}: {}", status, body)),
        }
    }

    /// Returns `true` for [`DocumentStoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentStoreError::NotFound)
    }

    /// Returns `true` for [`DocumentStoreError::Conflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, DocumentStoreError::Conflict(_))
    }
}

/// Operations consumed from the document store.
///
/// `index` arguments accept either a concrete index or an alias, except where
/// noted.
#[async_trait]
pub trait DocumentStoreApi: Send + Sync + Debug {
    /// Verifies the store answers requests.
    async fn ping(&self) -> Result<(), DocumentStoreError>;

    /// Returns the cluster health status (`green`, `yellow` or `red`).
    async fn cluster_status(&self) -> Result<String, DocumentStoreError>;

    /// Fetches a composable index template.
    async fn get_index_template(&self, name: &str) -> Result<Value, DocumentStoreError>;

    /// Stores a composable index template.
    ///
    /// With `create_only`, an existing template is left untouched and the call
    /// fails with [`DocumentStoreError::Conflict`].
    async fn put_index_template(
        &self,
        name: &str,
        body: Value,
        create_only: bool,
    ) -> Result<(), DocumentStoreError>;

    /// Indexes (creates or replaces) a document in a concrete index.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: Value,
        refresh: bool,
    ) -> Result<(), DocumentStoreError>;

    /// Fetches a document by id, loading only the given stored fields.
    ///
    /// An empty `stored_fields` loads no payload at all; the response still
    /// names the owning index.
    async fn get_document(
        &self,
        index: &str,
        id: &str,
        stored_fields: &[&str],
    ) -> Result<StoredDocument, DocumentStoreError>;

    /// Runs a search request.
    async fn search(&self, index: &str, body: Value) -> Result<SearchHits, DocumentStoreError>;

    /// Deletes a document from a concrete index.
    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        refresh: bool,
    ) -> Result<(), DocumentStoreError>;

    /// Deletes every document matching `query`, returning the deleted count.
    async fn delete_by_query(
        &self,
        index: &str,
        query: Value,
        refresh: bool,
    ) -> Result<u64, DocumentStoreError>;

    /// Lists the concrete indices an alias points to.
    async fn get_alias(&self, alias: &str) -> Result<Vec<String>, DocumentStoreError>;

    /// Deletes a concrete index.
    async fn delete_index(&self, index: &str) -> Result<(), DocumentStoreError>;
}

/// Parses the `_index`, `_id` and `fields` members of a get response or hit.
pub(crate) fn parse_stored_document(value: &Value) -> Option<StoredDocument> {
    let index = value.get("_index").and_then(|v| v.as_str())?;
    let id = value
        .get("_id")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let fields = value
        .get("fields")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    Some(StoredDocument {
        index: index.to_string(),
        id: id.to_string(),
        fields,
    })
}

/// Parses the `hits` member of a search response.
pub(crate) fn parse_search_hits(body: &Value) -> SearchHits {
    let hits = &body["hits"];
    let total = match &hits["total"] {
        Value::Object(total) => total.get("value").and_then(|v| v.as_u64()).unwrap_or(0),
        other => other.as_u64().unwrap_or(0),
    };
    let hits = hits["hits"]
        .as_array()
        .map(|arr| arr.iter().filter_map(parse_stored_document).collect())
        .unwrap_or_default();
    SearchHits { total, hits }
}
