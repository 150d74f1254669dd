//! Elastic Node Store
//!
//! Key-value storage for opaque byte "nodes" on top of Elasticsearch. Nodes
//! are written to one index per UTC day and read back through an alias that
//! spans every day, so old data can be dropped a whole index at a time.
//!
//! # Features
//!
//! - **Date partitioning**: writes land in `<prefix><YYYY-MM-DD><suffix>`
//! - **Alias routing**: reads and deletes find the owning partition by id
//! - **Retention**: drop every partition older than a cutoff in one sweep
//! - **Compact payloads**: zlib-compressed, base64-encoded, never indexed
//!
//! # Backend Features
//!
//! - `elasticsearch` (default) - HTTP client for Elasticsearch 7.x/8.x
//!
//! # Architecture
//!
//! - [`core`] - Storage traits ([`NodeStorage`], [`Backend`])
//! - [`backends`] - The Elasticsearch adapter and its client seam
//! - [`partition`] - Partition index naming and the clock
//! - [`codec`] - Payload encoding
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use elastic_nodestore::codec::{decode_node_data, encode_node_data};
//! use elastic_nodestore::partition::PartitionScheme;
//! use chrono::NaiveDate;
//!
//! let scheme = PartitionScheme::new("sentry-{date}").unwrap();
//! let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
//! assert_eq!(scheme.index_for_date(day), "sentry-2024-01-05");
//! assert_eq!(scheme.parse_index_date("sentry-2024-01-05").unwrap(), day);
//!
//! let encoded = encode_node_data(b"{\"event\":1}");
//! assert_eq!(decode_node_data(&encoded).unwrap(), b"{\"event\":1}");
//! ```
//!
//! # Logging
//!
//! All operations emit `tracing` events named `<area>.<action>[.<outcome>]`,
//! for example `document.get.warning` or `cleanup.completed`, with the node id
//! or index as structured fields.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod codec;
pub mod core;
pub mod error;
pub mod partition;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};

// Re-export core traits
pub use core::{Backend, NodeStorage};

pub use backends::elasticsearch::{
    CleanupReport, ElasticNodeStorage, ElasticNodeStoreConfig, parse_cutoff,
};
pub use partition::{Clock, FixedClock, PartitionScheme, SystemClock};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
