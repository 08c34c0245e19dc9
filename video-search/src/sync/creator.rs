//! Creator synchronizer.

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use video_search_repository::DocumentStoreError;
use video_search_shared::{CreatorDocument, UpsertCreator};

use crate::indexes::CreatorsIndex;
use crate::sync::SyncOutcome;

/// Keeps the `creators` index in sync with upsert events.
#[derive(Clone)]
pub struct CreatorSynchronizer {
    creators: CreatorsIndex,
}

/// Fields written when refreshing an existing creator. An absent thumbnail keeps the stored one.
fn refresh_fields(payload: &UpsertCreator) -> Value {
    let mut fields = Map::new();
    fields.insert(
        "displayName".to_string(),
        Value::String(payload.display_name.clone()),
    );
    fields.insert("nickname".to_string(), Value::String(payload.nickname.clone()));
    if let Some(thumbnail_url) = &payload.thumbnail_url {
        fields.insert(
            "thumbnailUrl".to_string(),
            Value::String(thumbnail_url.clone()),
        );
    }
    Value::Object(fields)
}

impl CreatorSynchronizer {
    pub fn new(creators: CreatorsIndex) -> Self {
        Self { creators }
    }

    /// Insert the creator, or refresh its profile fields if it already exists.
    #[instrument(skip(self, payload), fields(creator_id = %payload.id))]
    pub async fn upsert_creator(
        &self,
        payload: UpsertCreator,
    ) -> Result<SyncOutcome, DocumentStoreError> {
        if self.creators.get(&payload.id).await?.is_some() {
            self.creators
                .update(&payload.id, &refresh_fields(&payload))
                .await?;
            info!("Creator refreshed");
            return Ok(SyncOutcome::Applied);
        }

        let document = CreatorDocument {
            id: payload.id.clone(),
            display_name: payload.display_name.clone(),
            nickname: payload.nickname.clone(),
            thumbnail_url: payload.thumbnail_url.clone(),
        };

        match self.creators.create(&document).await {
            Ok(()) => {
                info!("Creator indexed");
                Ok(SyncOutcome::Applied)
            }
            Err(e) if e.is_conflict() => {
                // Lost a race with a concurrent insert of the same creator
                warn!("Creator created concurrently, refreshing instead");
                self.creators
                    .update(&payload.id, &refresh_fields(&payload))
                    .await?;
                Ok(SyncOutcome::Applied)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use video_search_repository::{
        DocumentQuery, DocumentStore, InMemoryDocumentStore, IndexSettings, QueryResult,
    };

    use crate::indexes::CREATORS_INDEX;
    use crate::provisioner::creators_index_settings;

    fn payload(display_name: &str, thumbnail_url: Option<&str>) -> UpsertCreator {
        UpsertCreator {
            id: "c1".to_string(),
            display_name: display_name.to_string(),
            nickname: "alice".to_string(),
            thumbnail_url: thumbnail_url.map(str::to_string),
        }
    }

    async fn store() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        store.ensure_index(&creators_index_settings()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_upsert_creates_then_refreshes() {
        let store = store().await;
        let creators = CreatorsIndex::new(Arc::new(store.clone()));
        let sync = CreatorSynchronizer::new(creators.clone());

        sync.upsert_creator(payload("Alice", Some("https://cdn.example.com/a.png")))
            .await
            .unwrap();
        sync.upsert_creator(payload("Alice B.", None)).await.unwrap();

        let creator = creators.get("c1").await.unwrap().unwrap();
        assert_eq!(creator.display_name, "Alice B.");
        assert_eq!(
            creator.thumbnail_url.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(store.document_count(CREATORS_INDEX), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = store().await;
        let creators = CreatorsIndex::new(Arc::new(store.clone()));
        let sync = CreatorSynchronizer::new(creators.clone());

        sync.upsert_creator(payload("Alice", None)).await.unwrap();
        let first = creators.get("c1").await.unwrap();
        sync.upsert_creator(payload("Alice", None)).await.unwrap();

        assert_eq!(first, creators.get("c1").await.unwrap());
    }

    /// Store whose `get` never sees the creator, so `create` hits the conflict path.
    struct RacingStore {
        inner: InMemoryDocumentStore,
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn ensure_index(&self, settings: &IndexSettings) -> Result<(), DocumentStoreError> {
            self.inner.ensure_index(settings).await
        }

        async fn get_document(
            &self,
            _index: &str,
            _id: &str,
        ) -> Result<Option<Value>, DocumentStoreError> {
            Ok(None)
        }

        async fn put_document(
            &self,
            index: &str,
            id: &str,
            document: &Value,
        ) -> Result<(), DocumentStoreError> {
            self.inner.put_document(index, id, document).await
        }

        async fn create_document(
            &self,
            index: &str,
            id: &str,
            document: &Value,
        ) -> Result<(), DocumentStoreError> {
            self.inner.create_document(index, id, document).await
        }

        async fn update_document(
            &self,
            index: &str,
            id: &str,
            partial: &Value,
        ) -> Result<(), DocumentStoreError> {
            self.inner.update_document(index, id, partial).await
        }

        async fn query(
            &self,
            index: &str,
            query: &DocumentQuery,
        ) -> Result<QueryResult, DocumentStoreError> {
            self.inner.query(index, query).await
        }
    }

    #[tokio::test]
    async fn test_upsert_conflict_falls_back_to_update() {
        let inner = store().await;
        let sync = CreatorSynchronizer::new(CreatorsIndex::new(Arc::new(RacingStore {
            inner: inner.clone(),
        })));

        sync.upsert_creator(payload("Alice", None)).await.unwrap();
        let outcome = sync.upsert_creator(payload("Alice B.", None)).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Applied);

        let stored = CreatorsIndex::new(Arc::new(inner))
            .get("c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.display_name, "Alice B.");
    }
}
