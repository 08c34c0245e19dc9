//! Dependency initialization and wiring for the video search service.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use video_search_repository::{DocumentStore, IndexConfig, OpenSearchProvider};

use crate::config::{env_list, env_or, env_parse};
use crate::consumer::KafkaConsumer;
use crate::federation::{QueryConfig, QueryEngine};
use crate::indexes::{CreatorsIndex, VideosIndex};
use crate::orchestrator::Orchestrator;
use crate::processor::EventProcessor;
use crate::provisioner::IndexProvisioner;
use crate::sync::SyncConfig;
use crate::IndexingError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "video-search";

/// Default Kafka topics.
const DEFAULT_KAFKA_TOPICS: &str = "video-search.events";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 8080;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection at a fixed interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode. Valid values are "fail-fast" and "retry" (case-insensitive).
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Some(Self::FailFast),
            "retry" => Some(Self::Retry),
            _ => None,
        }
    }

    /// Read `OPENSEARCH_CONNECTION_MODE`, defaulting to "retry" if unset or invalid.
    fn from_env() -> Self {
        let raw = env_or("OPENSEARCH_CONNECTION_MODE", "retry");
        Self::parse(&raw).unwrap_or_else(|| {
            warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
            Self::Retry
        })
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// The query engine served over HTTP.
    pub query_engine: QueryEngine,
    /// Address the HTTP server binds to.
    pub http_addr: SocketAddr,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `INDEX_VERSION`: Physical index version number (default: 0)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group ID (default: video-search)
    /// - `KAFKA_TOPICS`: Comma separated topics (default: video-search.events)
    /// - `HTTP_HOST` / `HTTP_PORT`: HTTP bind address (default: 0.0.0.0:8080)
    /// - `SEARCH_STATUS_FILTER`, `METRICS_STALENESS_GUARD`, `RECOMPUTE_TAGS_ON_UPDATE`
    ///
    /// The indexes are provisioned before anything else is built. Provisioning failure is
    /// fatal.
    pub async fn new() -> Result<Self, IndexingError> {
        let opensearch_url = env_or("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL);
        let kafka_broker = env_or("KAFKA_BROKER", DEFAULT_KAFKA_BROKER);
        let kafka_group_id = env_or("KAFKA_GROUP_ID", DEFAULT_KAFKA_GROUP_ID);
        let kafka_topics = env_list("KAFKA_TOPICS", DEFAULT_KAFKA_TOPICS);
        let connection_mode = ConnectionMode::from_env();
        let retry_interval =
            env_parse("OPENSEARCH_RETRY_INTERVAL_SECS", DEFAULT_RETRY_INTERVAL_SECS);
        let index_version = env_parse("INDEX_VERSION", 0u32);
        let http_addr = Self::http_addr()?;
        let sync_config = SyncConfig::from_env();
        let query_config = QueryConfig::from_env();

        info!(
            opensearch_url = %opensearch_url,
            kafka_broker = %kafka_broker,
            kafka_group_id = %kafka_group_id,
            kafka_topics = ?kafka_topics,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            index_version = index_version,
            http_addr = %http_addr,
            sync_config = ?sync_config,
            status_filter = ?query_config.status_filter,
            "Initializing dependencies"
        );

        let provider = Self::connect_to_opensearch(
            &opensearch_url,
            IndexConfig::new(index_version),
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");

        let store: Arc<dyn DocumentStore> = Arc::new(provider);

        IndexProvisioner::new(store.clone())
            .provision()
            .await
            .map_err(|e| IndexingError::provisioning(e.to_string()))?;

        let consumer = KafkaConsumer::new(&kafka_broker, &kafka_group_id, kafka_topics)
            .map_err(|e| IndexingError::config(format!("Failed to create Kafka consumer: {}", e)))?;

        info!("Kafka consumer created");

        let processor = EventProcessor::new(store.clone(), sync_config);
        let orchestrator = Orchestrator::new(Arc::new(consumer), processor);

        let query_engine = QueryEngine::new(
            VideosIndex::new(store.clone()),
            CreatorsIndex::new(store),
            query_config,
        );

        Ok(Self {
            orchestrator,
            query_engine,
            http_addr,
        })
    }

    fn http_addr() -> Result<SocketAddr, IndexingError> {
        let host = env_or("HTTP_HOST", DEFAULT_HTTP_HOST);
        let port = env_parse("HTTP_PORT", DEFAULT_HTTP_PORT);
        let ip: IpAddr = host
            .parse()
            .map_err(|e| IndexingError::config(format!("Invalid HTTP_HOST '{}': {}", host, e)))?;
        Ok(SocketAddr::new(ip, port))
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        loop {
            match Self::try_connect_opensearch(url, index_config.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Create the provider and check that the cluster answers.
    async fn try_connect_opensearch(
        url: &str,
        index_config: IndexConfig,
    ) -> Result<OpenSearchProvider, IndexingError> {
        let provider = OpenSearchProvider::new(url, index_config)
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;

        provider
            .ping()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch ping failed: {}", e)))?;

        Ok(provider)
    }
}
