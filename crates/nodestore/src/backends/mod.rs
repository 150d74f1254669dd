//! Storage backend implementations.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Elasticsearch | `elasticsearch` | Date-partitioned indices behind an alias |
//!
//! The Elasticsearch adapter logic is always compiled; the feature only adds
//! the HTTP client. Without it, bring your own
//! [`DocumentStoreApi`](elasticsearch::DocumentStoreApi) implementation.

pub mod elasticsearch;
