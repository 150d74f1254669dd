//! Elasticsearch node store: construction and [`Backend`] implementation.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument::{Instrumented, WithDispatch, WithSubscriber};
use tracing::{Dispatch, Instrument, Span};

use crate::core::Backend;
use crate::error::{BackendError, StorageResult};
use crate::partition::{Clock, PartitionScheme, SystemClock};

use super::client::DocumentStoreApi;
use super::config::ElasticNodeStoreConfig;

pub(crate) const BACKEND_NAME: &str = "elasticsearch";

/// Node storage on date-partitioned Elasticsearch indices.
///
/// Writes go to the index of the current UTC day; reads and deletes find the
/// owning index through the configured alias. See the module documentation
/// for the full layout.
///
/// The adapter holds no mutable state. Every operation is a plain
/// request/response exchange and it is safe to share one instance between
/// tasks behind an `Arc`.
///
/// # Logging
///
/// The adapter captures the `tracing` dispatcher that is current when it is
/// created, or the one passed to [`with_dispatch`](Self::with_dispatch), and
/// runs every operation inside it and inside a `nodestore` span carrying the
/// alias name.
pub struct ElasticNodeStorage {
    pub(crate) client: Arc<dyn DocumentStoreApi>,
    pub(crate) config: ElasticNodeStoreConfig,
    pub(crate) scheme: PartitionScheme,
    pub(crate) clock: Arc<dyn Clock>,
    dispatch: Dispatch,
    span: Span,
}

impl Debug for ElasticNodeStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticNodeStorage")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

fn make_span(dispatch: &Dispatch, config: &ElasticNodeStoreConfig) -> Span {
    tracing::dispatcher::with_default(dispatch, || {
        tracing::info_span!(
            "nodestore",
            backend = BACKEND_NAME,
            alias = %config.alias_name
        )
    })
}

impl ElasticNodeStorage {
    /// Creates the adapter without contacting the store.
    ///
    /// `config.validate_on_init` is ignored here; use [`connect`](Self::connect)
    /// to honor it.
    pub fn new(
        client: Arc<dyn DocumentStoreApi>,
        config: ElasticNodeStoreConfig,
    ) -> StorageResult<Self> {
        let scheme = config.validate()?;
        let dispatch = tracing::dispatcher::get_default(|d| d.clone());
        let span = make_span(&dispatch, &config);

        Ok(Self {
            client,
            config,
            scheme,
            clock: Arc::new(SystemClock),
            dispatch,
            span,
        })
    }

    /// Creates the adapter, pinging the store first when
    /// `config.validate_on_init` is set.
    pub async fn connect(
        client: Arc<dyn DocumentStoreApi>,
        config: ElasticNodeStoreConfig,
    ) -> StorageResult<Self> {
        let storage = Self::new(client, config)?;
        if storage.config.validate_on_init {
            storage.validate_connection().await?;
        }
        Ok(storage)
    }

    /// Creates the adapter over an Elasticsearch HTTP client.
    #[cfg(feature = "elasticsearch")]
    pub async fn from_connection(
        connection: &super::config::ElasticsearchConnectionConfig,
        config: ElasticNodeStoreConfig,
    ) -> StorageResult<Self> {
        let client = super::transport::ElasticsearchClient::new(connection)?;
        Self::connect(Arc::new(client), config).await
    }

    /// Replaces the clock used to pick the write partition.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Routes this adapter's log output to `dispatch`.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.span = make_span(&dispatch, &self.config);
        self.dispatch = dispatch;
        self
    }

    /// Returns the adapter configuration.
    pub fn config(&self) -> &ElasticNodeStoreConfig {
        &self.config
    }

    /// Returns the partition naming scheme.
    pub fn scheme(&self) -> &PartitionScheme {
        &self.scheme
    }

    /// Returns the index that a write issued now would target.
    pub fn write_index(&self) -> String {
        self.scheme.write_index(self.clock.as_ref())
    }

    /// Runs `fut` inside this adapter's dispatcher and span.
    pub(crate) fn scoped<F: Future>(&self, fut: F) -> WithDispatch<Instrumented<F>> {
        fut.instrument(self.span.clone())
            .with_subscriber(self.dispatch.clone())
    }

    /// Creates the index template unless it already exists.
    ///
    /// Idempotent. An existing template is left untouched.
    pub async fn ensure_template(&self) -> Result<(), BackendError> {
        self.scoped(super::schema::ensure_template(self)).await
    }

    async fn validate_connection(&self) -> Result<(), BackendError> {
        self.scoped(async {
            self.client.ping().await.map_err(|e| {
                tracing::error!(error = %e, "connection.validate.error");
                BackendError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: format!("Failed to connect to Elasticsearch: {}", e),
                }
            })
        })
        .await
    }
}

#[async_trait]
impl Backend for ElasticNodeStorage {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        self.scoped(async {
            let status =
                self.client
                    .cluster_status()
                    .await
                    .map_err(|e| BackendError::Unavailable {
                        backend_name: BACKEND_NAME.to_string(),
                        message: format!("Health check failed: {}", e),
                    })?;

            if status == "red" {
                return Err(BackendError::Unavailable {
                    backend_name: BACKEND_NAME.to_string(),
                    message: "Cluster status is red".to_string(),
                });
            }

            tracing::debug!(status = %status, "health.check");
            Ok(())
        })
        .await
    }

    async fn bootstrap(&self) -> Result<(), BackendError> {
        self.ensure_template().await
    }
}
