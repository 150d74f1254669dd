//! Core storage traits and abstractions.
//!
//! - [`NodeStorage`] - Byte-oriented key-value operations used by the host
//! - [`Backend`] - Operational hooks (health check, bootstrap)

mod backend;
mod storage;

pub use backend::Backend;
pub use storage::NodeStorage;
