//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `DocumentStore` using the OpenSearch
//! Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    CreateParts, GetParts, IndexParts, OpenSearch, SearchParts, UpdateParts,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::errors::DocumentStoreError;
use crate::interfaces::DocumentStore;
use crate::opensearch::index_config::IndexConfig;
use crate::opensearch::queries::{build_search_body, parse_search_response};
use crate::types::{DocumentQuery, IndexSettings, QueryResult};

/// OpenSearch provider implementation.
///
/// Document operations address indexes by their alias. Index settings registered through
/// `ensure_index` are kept so queries can be built with the right searchable fields and
/// ranking rules.
///
/// # Example
///
/// ```ignore
/// use video_search_repository::opensearch::{IndexConfig, OpenSearchProvider};
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::new(0)).await?;
/// provider.ensure_index(&settings).await?;
/// let doc = provider.get_document("videos", "0b6a5d3c-94a4-4c4a-9a4f-3f5f7f0f7a11").await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
    settings: RwLock<HashMap<String, IndexSettings>>,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing the version and shard layout
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(DocumentStoreError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, DocumentStoreError> {
        let parsed_url =
            Url::parse(url).map_err(|e| DocumentStoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| DocumentStoreError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
            settings: RwLock::new(HashMap::new()),
        })
    }

    /// Check that the cluster answers a ping.
    pub async fn ping(&self) -> Result<(), DocumentStoreError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| DocumentStoreError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(DocumentStoreError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }

    async fn settings_for(&self, index: &str) -> Result<IndexSettings, DocumentStoreError> {
        self.settings
            .read()
            .await
            .get(index)
            .cloned()
            .ok_or_else(|| {
                DocumentStoreError::validation(format!("index '{}' has not been provisioned", index))
            })
    }

    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    async fn create_index(&self, settings: &IndexSettings) -> Result<(), DocumentStoreError> {
        let physical_name = self.index_config.versioned_index_name(&settings.name);
        let body = self.index_config.create_index_body(settings);

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&physical_name))
            .body(body)
            .send()
            .await
            .map_err(|e| DocumentStoreError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = %physical_name, alias = %settings.name, "Created index");
            return Ok(());
        }

        let error_body = Self::error_body(response).await;
        // Another replica may have created it between the existence check and the create
        if status.as_u16() == 400 && error_body.contains("resource_already_exists_exception") {
            debug!(index = %physical_name, "Index already exists");
            return Ok(());
        }

        error!(status = %status, body = %error_body, "Create index request failed");
        Err(DocumentStoreError::index_creation(format!(
            "Create index {} failed with status {}: {}",
            physical_name, status, error_body
        )))
    }
}

#[async_trait]
impl DocumentStore for OpenSearchProvider {
    /// Create the versioned index with its alias if the alias does not resolve yet.
    ///
    /// An existing index keeps its mapping; changing the mapping requires a new index version.
    #[instrument(skip(self, settings), fields(index = %settings.name))]
    async fn ensure_index(&self, settings: &IndexSettings) -> Result<(), DocumentStoreError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[settings.name.as_str()]))
            .send()
            .await
            .map_err(|e| DocumentStoreError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => debug!("Index alias already exists"),
            404 => self.create_index(settings).await?,
            other => {
                let error_body = Self::error_body(response).await;
                return Err(DocumentStoreError::index_creation(format!(
                    "Index existence check failed with status {}: {}",
                    other, error_body
                )));
            }
        }

        self.settings
            .write()
            .await
            .insert(settings.name.clone(), settings.clone());
        Ok(())
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, DocumentStoreError> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| DocumentStoreError::get(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Get request failed");
            return Err(DocumentStoreError::get(format!(
                "Get failed with status {}: {}",
                status, error_body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| DocumentStoreError::parse(e.to_string()))?;

        if body.get("found").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }
        Ok(body.get("_source").cloned())
    }

    async fn put_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), DocumentStoreError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(document)
            .send()
            .await
            .map_err(|e| DocumentStoreError::write(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(DocumentStoreError::write(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, id = %id, "Document written");
        Ok(())
    }

    async fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), DocumentStoreError> {
        let response = self
            .client
            .create(CreateParts::IndexId(index, id))
            .body(document)
            .send()
            .await
            .map_err(|e| DocumentStoreError::write(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 409 {
            return Err(DocumentStoreError::document_exists(index, id));
        }
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Create request failed");
            return Err(DocumentStoreError::write(format!(
                "Create failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, id = %id, "Document created");
        Ok(())
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), DocumentStoreError> {
        let response = self
            .client
            .update(UpdateParts::IndexId(index, id))
            .body(json!({ "doc": partial }))
            .send()
            .await
            .map_err(|e| DocumentStoreError::write(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(DocumentStoreError::document_not_found(index, id));
        }
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Update request failed");
            return Err(DocumentStoreError::write(format!(
                "Update failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, id = %id, "Document updated");
        Ok(())
    }

    #[instrument(skip(self, query), fields(offset = query.offset, limit = query.limit))]
    async fn query(
        &self,
        index: &str,
        query: &DocumentQuery,
    ) -> Result<QueryResult, DocumentStoreError> {
        let settings = self.settings_for(index).await?;
        settings.validate_query(query)?;

        let body = build_search_body(&settings, query);
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| DocumentStoreError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            warn!(status = %status, body = %error_body, "Search request failed");
            return Err(DocumentStoreError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| DocumentStoreError::parse(e.to_string()))?;

        parse_search_response(&body, &query.facets)
    }
}
