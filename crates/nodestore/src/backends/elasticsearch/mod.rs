//! Elasticsearch node store.
//!
//! Nodes are opaque byte payloads keyed by a caller-chosen id. Each node is
//! stored as one document in a date-partitioned index, compressed and
//! base64-encoded into a single stored field.
//!
//! # Index Structure
//!
//! Partition indices are named from a pattern with a `{date}` placeholder:
//! `nodestore-{date}` yields `nodestore-2024-01-05`. A write always lands in
//! the partition of the current UTC day. An index template matching
//! `<prefix>*` gives every partition the mapping below and adds it to the
//! alias, so reads, deletes and the retention sweep see all partitions
//! through one name.
//!
//! ```text
//! alias "nodestore"
//!   |- nodestore-2024-01-04   { _id: <node id>, data: base64(zlib(bytes)), timestamp }
//!   |- nodestore-2024-01-05
//!   `- ...
//! ```
//!
//! The same id written on two different days ends up in two partitions.
//! Reads treat that as ambiguous and return nothing; deletes remove every
//! copy.
//!
//! # Example
//!
//! ```ignore
//! use elastic_nodestore::backends::elasticsearch::{
//!     ElasticNodeStorage, ElasticNodeStoreConfig, ElasticsearchConnectionConfig,
//! };
//! use elastic_nodestore::{Backend, NodeStorage};
//!
//! let storage = ElasticNodeStorage::from_connection(
//!     &ElasticsearchConnectionConfig::default(),
//!     ElasticNodeStoreConfig::default(),
//! )
//! .await?;
//! storage.bootstrap().await?;
//! storage.set_bytes("node-1", b"payload").await?;
//! assert_eq!(storage.get_bytes("node-1").await, Some(b"payload".to_vec()));
//! ```

mod backend;
mod client;
mod config;
mod retention;
mod schema;
mod storage;
#[cfg(feature = "elasticsearch")]
mod transport;


pub use backend::ElasticNodeStorage;
pub use client::{DocumentStoreApi, DocumentStoreError, NO_STORED_FIELDS, SearchHits, StoredDocument};
pub use config::{ElasticNodeStoreConfig, ElasticsearchAuth, ElasticsearchConnectionConfig};
pub use retention::{
    CleanupReport, PartitionIndex, RetentionPlan, SkippedIndex, parse_cutoff,
};
pub use schema::index_template_body;
pub use storage::{DATA_FIELD, NodeDocument, TIMESTAMP_FIELD};
#[cfg(feature = "elasticsearch")]
pub use transport::ElasticsearchClient;
