//! Index template for partition indices.
//!
//! Every partition index is created implicitly by the first write of its day.
//! The template makes sure such indices get the node mapping and join the
//! alias that reads, deletes and the retention sweep go through.

use serde_json::{Value, json};

use crate::error::BackendError;
use crate::partition::PartitionScheme;

use super::backend::{BACKEND_NAME, ElasticNodeStorage};
use super::config::ElasticNodeStoreConfig;

/// Builds the composable index template body.
///
/// The mapping stores documents without `_source` and without dynamic fields:
/// - `data`: compressed payload, stored but not indexed
/// - `timestamp`: write time, stored as a date
pub fn index_template_body(config: &ElasticNodeStoreConfig, scheme: &PartitionScheme) -> Value {
    let mut aliases = serde_json::Map::new();
    aliases.insert(config.alias_name.clone(), json!({}));

    json!({
        "index_patterns": [scheme.template_pattern()],
        "template": {
            "settings": {
                "index": {
                    "number_of_shards": config.number_of_shards,
                    "number_of_replicas": config.number_of_replicas
                }
            },
            "mappings": {
                "_source": { "enabled": false },
                "dynamic": "false",
                "dynamic_templates": [],
                "properties": {
                    "data": {
                        "type": "text",
                        "index": false,
                        "store": true
                    },
                    "timestamp": {
                        "type": "date",
                        "store": true
                    }
                }
            },
            "aliases": aliases
        }
    })
}

/// Creates the index template unless one with the configured name exists.
///
/// An existing template is never overwritten; it may have been tuned by an
/// operator after creation. Losing a creation race to another process is not
/// an error.
pub(crate) async fn ensure_template(storage: &ElasticNodeStorage) -> Result<(), BackendError> {
    let template = storage.config.template_name.as_str();

    match storage.client.get_index_template(template).await {
        Ok(_) => {
            tracing::info!(template = %template, status = "exists", "bootstrap.template.check");
            return Ok(());
        }
        Err(e) if e.is_not_found() => {
            tracing::info!(template = %template, status = "not found", "bootstrap.template.check");
        }
        Err(e) => {
            tracing::error!(template = %template, error = %e, "bootstrap.template.check.error");
            return Err(BackendError::request(
                BACKEND_NAME,
                "get_index_template",
                template,
                e,
            ));
        }
    }

    let body = index_template_body(&storage.config, &storage.scheme);
    match storage.client.put_index_template(template, body, true).await {
        Ok(()) => {
            tracing::info!(
                template = %template,
                alias = %storage.config.alias_name,
                pattern = %storage.scheme.template_pattern(),
                "bootstrap.template.create"
            );
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            tracing::info!(
                template = %template,
                status = "created concurrently",
                "bootstrap.template.create"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(template = %template, error = %e, "bootstrap.template.create.error");
            Err(BackendError::request(
                BACKEND_NAME,
                "put_index_template",
                template,
                e,
            ))
        }
    }
}
