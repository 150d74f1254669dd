//! Configuration for the Elasticsearch node store.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::partition::{DEFAULT_INDEX_PATTERN, PartitionScheme};

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Connection settings for the Elasticsearch HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConnectionConfig {
    /// Elasticsearch node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for ElasticsearchConnectionConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            auth: None,
            request_timeout_ms: default_request_timeout_ms(),
            disable_certificate_validation: false,
        }
    }
}

/// Configuration for the node store adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticNodeStoreConfig {
    /// Index naming pattern with a `{date}` placeholder
    /// (default: `"nodestore-{date}"`).
    #[serde(default = "default_index")]
    pub index: String,

    /// Make writes and deletes visible to readers before returning
    /// (default: false, favoring throughput).
    #[serde(default)]
    pub refresh: bool,

    /// Name of the index template (default: `"nodestore"`).
    #[serde(default = "default_template_name")]
    pub template_name: String,

    /// Alias spanning every partition index (default: `"nodestore"`).
    #[serde(default = "default_alias_name")]
    pub alias_name: String,

    /// Ping the store when the adapter is created (default: false).
    #[serde(default)]
    pub validate_on_init: bool,

    /// Number of primary shards per partition index (default: 3).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replica shards per partition index (default: 0).
    #[serde(default)]
    pub number_of_replicas: u32,
}

fn default_index() -> String {
    DEFAULT_INDEX_PATTERN.to_string()
}

fn default_template_name() -> String {
    "nodestore".to_string()
}

fn default_alias_name() -> String {
    "nodestore".to_string()
}

fn default_shards() -> u32 {
    3
}

impl Default for ElasticNodeStoreConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
            refresh: false,
            template_name: default_template_name(),
            alias_name: default_alias_name(),
            validate_on_init: false,
            number_of_shards: default_shards(),
            number_of_replicas: 0,
        }
    }
}

impl ElasticNodeStoreConfig {
    /// Validates configuration invariants and returns the partition scheme.
    pub fn validate(&self) -> Result<PartitionScheme, ValidationError> {
        let scheme = PartitionScheme::new(self.index.clone())?;

        if self.template_name.trim().is_empty() {
            return Err(ValidationError::InvalidConfig {
                field: "template_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.alias_name.trim().is_empty() {
            return Err(ValidationError::InvalidConfig {
                field: "alias_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        // The alias must not itself look like a partition, or the template
        // pattern would claim it.
        if scheme.parse_index_date(&self.alias_name).is_ok() {
            return Err(ValidationError::InvalidConfig {
                field: "alias_name".to_string(),
                message: format!("must not match the index pattern '{}'", self.index),
            });
        }

        if self.number_of_shards == 0 {
            return Err(ValidationError::InvalidConfig {
                field: "number_of_shards".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        Ok(scheme)
    }
}
