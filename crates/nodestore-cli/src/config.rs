//! Command line configuration.
//!
//! Every global option can also be set from the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `NODESTORE_NODES` | http://localhost:9200 | Elasticsearch URL(s), comma-separated |
//! | `NODESTORE_USERNAME` | | Basic auth user |
//! | `NODESTORE_PASSWORD` | | Basic auth password |
//! | `NODESTORE_INDEX` | nodestore-{date} | Partition index pattern |
//! | `NODESTORE_ALIAS` | nodestore | Alias over all partitions |
//! | `NODESTORE_TEMPLATE` | nodestore | Index template name |
//! | `NODESTORE_REFRESH` | false | Refresh after writes and deletes |
//! | `NODESTORE_VALIDATE` | false | Ping the cluster before running |
//! | `NODESTORE_REQUEST_TIMEOUT_MS` | 30000 | Request timeout |
//! | `NODESTORE_INSECURE` | false | Skip TLS certificate validation |
//! | `NODESTORE_LOG_LEVEL` | info | Log level |

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use elastic_nodestore::backends::elasticsearch::{
    ElasticNodeStoreConfig, ElasticsearchAuth, ElasticsearchConnectionConfig,
};

/// Node store command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "nodestore")]
#[command(about = "Manage node storage on date-partitioned Elasticsearch indices")]
#[command(version)]
pub struct CliConfig {
    /// Elasticsearch node URLs (comma-separated; the first one is used).
    #[arg(
        long,
        env = "NODESTORE_NODES",
        default_value = "http://localhost:9200",
        global = true
    )]
    pub nodes: String,

    /// Username for basic authentication.
    #[arg(long, env = "NODESTORE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for basic authentication.
    #[arg(long, env = "NODESTORE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Partition index pattern; must contain `{date}` once.
    #[arg(long, env = "NODESTORE_INDEX", default_value = "nodestore-{date}", global = true)]
    pub index: String,

    /// Alias spanning every partition index.
    #[arg(long, env = "NODESTORE_ALIAS", default_value = "nodestore", global = true)]
    pub alias: String,

    /// Index template name.
    #[arg(long, env = "NODESTORE_TEMPLATE", default_value = "nodestore", global = true)]
    pub template: String,

    /// Make writes and deletes visible before returning.
    #[arg(long, env = "NODESTORE_REFRESH", global = true)]
    pub refresh: bool,

    /// Ping the cluster before running the command.
    #[arg(long, env = "NODESTORE_VALIDATE", global = true)]
    pub validate: bool,

    /// Request timeout in milliseconds.
    #[arg(
        long,
        env = "NODESTORE_REQUEST_TIMEOUT_MS",
        default_value = "30000",
        global = true
    )]
    pub request_timeout_ms: u64,

    /// Skip TLS certificate validation.
    #[arg(long, env = "NODESTORE_INSECURE", global = true)]
    pub insecure: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "NODESTORE_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the index template if it does not exist.
    Bootstrap,

    /// Delete every partition older than a cutoff.
    Cleanup {
        /// Cutoff as an RFC 3339 timestamp or a YYYY-MM-DD date (UTC).
        #[arg(long, conflicts_with = "older_than", required_unless_present = "older_than")]
        cutoff: Option<String>,

        /// Cutoff as an age relative to now, e.g. `30days`.
        #[arg(long)]
        older_than: Option<String>,

        /// List what would be deleted without deleting.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check cluster health.
    Health,

    /// Write a node's payload to stdout. Exits with 1 if the node is absent.
    Get {
        /// Node id.
        id: String,
    },

    /// Store a node, reading the payload from a file or stdin.
    Set {
        /// Node id.
        id: String,

        /// Read the payload from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete one or more nodes.
    Delete {
        /// Node ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

impl CliConfig {
    /// Returns the configured node URLs.
    pub fn node_list(&self) -> Vec<String> {
        self.nodes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Builds the HTTP connection settings.
    pub fn connection_config(&self) -> ElasticsearchConnectionConfig {
        let auth = match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        ElasticsearchConnectionConfig {
            nodes: self.node_list(),
            auth,
            request_timeout_ms: self.request_timeout_ms,
            disable_certificate_validation: self.insecure,
        }
    }

    /// Builds the adapter configuration.
    pub fn store_config(&self) -> ElasticNodeStoreConfig {
        ElasticNodeStoreConfig {
            index: self.index.clone(),
            refresh: self.refresh,
            template_name: self.template.clone(),
            alias_name: self.alias.clone(),
            validate_on_init: self.validate,
            ..Default::default()
        }
    }

    /// Validates the configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.node_list().is_empty() {
            errors.push("At least one Elasticsearch node is required".to_string());
        }

        if self.username.is_some() != self.password.is_some() {
            errors.push("Username and password must be given together".to_string());
        }

        if self.request_timeout_ms == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if let Err(e) = self.store_config().validate() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
