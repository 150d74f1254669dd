//! [`DocumentStoreApi`] over the official Elasticsearch client.

use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::cluster::ClusterHealthParts;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesDeleteParts, IndicesGetAliasParts, IndicesGetIndexTemplateParts,
    IndicesPutIndexTemplateParts,
};
use elasticsearch::params::Refresh;
use elasticsearch::{
    DeleteByQueryParts, DeleteParts, Elasticsearch, GetParts, IndexParts, SearchParts,
};
use serde_json::{Value, json};

use crate::error::BackendError;

use super::backend::BACKEND_NAME;
use super::client::{
    DocumentStoreApi, DocumentStoreError, NO_STORED_FIELDS, SearchHits, StoredDocument,
    parse_search_hits, parse_stored_document,
};
use super::config::{ElasticsearchAuth, ElasticsearchConnectionConfig};

/// Elasticsearch HTTP client.
#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    client: Elasticsearch,
}

impl ElasticsearchClient {
    /// Wraps an already configured client.
    pub fn from_client(client: Elasticsearch) -> Self {
        Self { client }
    }

    /// Builds the client from connection settings. Does not connect.
    pub fn new(config: &ElasticsearchConnectionConfig) -> Result<Self, BackendError> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url =
            url.parse().map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Invalid URL '{}': {}", url, e),
            })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME.to_string(),
            message: format!("Failed to build transport: {}", e),
        })?;

        Ok(Self::from_client(Elasticsearch::new(transport)))
    }

    /// Returns the underlying client.
    pub fn inner(&self) -> &Elasticsearch {
        &self.client
    }
}

fn refresh_param(refresh: bool) -> Refresh {
    if refresh { Refresh::True } else { Refresh::False }
}

fn transport_error(e: elasticsearch::Error) -> DocumentStoreError {
    match e.status_code() {
        Some(status) => DocumentStoreError::from_status(status.as_u16(), e.to_string()),
        None => DocumentStoreError::Unavailable(e.to_string()),
    }
}

/// Turns transport failures and non-success statuses into errors.
async fn check(
    result: Result<Response, elasticsearch::Error>,
) -> Result<Response, DocumentStoreError> {
    let response = result.map_err(transport_error)?;
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DocumentStoreError::from_status(status.as_u16(), body))
}

async fn json_body(response: Response) -> Result<Value, DocumentStoreError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| DocumentStoreError::Internal(format!("Failed to parse ES response: {}", e)))
}

#[async_trait]
impl DocumentStoreApi for ElasticsearchClient {
    async fn ping(&self) -> Result<(), DocumentStoreError> {
        check(self.client.info().send().await).await?;
        Ok(())
    }

    async fn cluster_status(&self) -> Result<String, DocumentStoreError> {
        let response = check(
            self.client
                .cluster()
                .health(ClusterHealthParts::None)
                .send()
                .await,
        )
        .await?;
        let body = json_body(response).await?;
        Ok(body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown")
            .to_string())
    }

    async fn get_index_template(&self, name: &str) -> Result<Value, DocumentStoreError> {
        let response = check(
            self.client
                .indices()
                .get_index_template(IndicesGetIndexTemplateParts::Name(name))
                .send()
                .await,
        )
        .await?;
        json_body(response).await
    }

    async fn put_index_template(
        &self,
        name: &str,
        body: Value,
        create_only: bool,
    ) -> Result<(), DocumentStoreError> {
        check(
            self.client
                .indices()
                .put_index_template(IndicesPutIndexTemplateParts::Name(name))
                .create(create_only)
                .body(body)
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: Value,
        refresh: bool,
    ) -> Result<(), DocumentStoreError> {
        check(
            self.client
                .index(IndexParts::IndexId(index, id))
                .refresh(refresh_param(refresh))
                .body(document)
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn get_document(
        &self,
        index: &str,
        id: &str,
        stored_fields: &[&str],
    ) -> Result<StoredDocument, DocumentStoreError> {
        let mut request = self.client.get(GetParts::IndexId(index, id));
        request = if stored_fields.is_empty() {
            request._source(&["false"]).stored_fields(&[NO_STORED_FIELDS])
        } else {
            request.stored_fields(stored_fields)
        };

        let response = check(request.send().await).await?;
        let body = json_body(response).await?;

        if body.get("found").and_then(|f| f.as_bool()) == Some(false) {
            return Err(DocumentStoreError::NotFound);
        }
        parse_stored_document(&body).ok_or_else(|| {
            DocumentStoreError::Internal("get response is missing _index".to_string())
        })
    }

    async fn search(&self, index: &str, body: Value) -> Result<SearchHits, DocumentStoreError> {
        let response = check(
            self.client
                .search(SearchParts::Index(&[index]))
                .body(body)
                .send()
                .await,
        )
        .await?;
        let body = json_body(response).await?;
        Ok(parse_search_hits(&body))
    }

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        refresh: bool,
    ) -> Result<(), DocumentStoreError> {
        check(
            self.client
                .delete(DeleteParts::IndexId(index, id))
                .refresh(refresh_param(refresh))
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn delete_by_query(
        &self,
        index: &str,
        query: Value,
        refresh: bool,
    ) -> Result<u64, DocumentStoreError> {
        let response = check(
            self.client
                .delete_by_query(DeleteByQueryParts::Index(&[index]))
                .refresh(refresh)
                .body(json!({ "query": query }))
                .send()
                .await,
        )
        .await?;
        let body = json_body(response).await?;
        Ok(body.get("deleted").and_then(|d| d.as_u64()).unwrap_or(0))
    }

    async fn get_alias(&self, alias: &str) -> Result<Vec<String>, DocumentStoreError> {
        let response = check(
            self.client
                .indices()
                .get_alias(IndicesGetAliasParts::Name(&[alias]))
                .send()
                .await,
        )
        .await?;
        let body = json_body(response).await?;
        let mut indices: Vec<String> = body
            .as_object()
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default();
        indices.sort();
        Ok(indices)
    }

    async fn delete_index(&self, index: &str) -> Result<(), DocumentStoreError> {
        check(
            self.client
                .indices()
                .delete(IndicesDeleteParts::Index(&[index]))
                .send()
                .await,
        )
        .await?;
        Ok(())
    }
}
