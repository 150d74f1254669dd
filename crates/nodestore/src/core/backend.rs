//! Backend abstraction for document store drivers.
//!
//! [`NodeStorage`](super::NodeStorage) is the hot-path contract. The [`Backend`]
//! trait carries the operational side that tooling calls: health checks and
//! the one-time bootstrap of store-side configuration.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// A document store backend that can be bootstrapped and health-checked.
///
/// # Example
///
/// ```ignore
/// use elastic_nodestore::core::Backend;
///
/// async fn prepare<B: Backend>(backend: &B) -> Result<(), elastic_nodestore::error::BackendError> {
///     backend.health_check().await?;
///     backend.bootstrap().await
/// }
/// ```
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Checks if the backend is healthy and accepting requests.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Creates store-side configuration the backend relies on, if missing.
    ///
    /// Must be idempotent and must not overwrite configuration that already
    /// exists.
    async fn bootstrap(&self) -> Result<(), BackendError>;
}
