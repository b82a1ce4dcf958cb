use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::RunContext;
use super::traits::EntityIndex;
use crate::content::models::ENTITY_TYPE_SCENE;
use crate::content::traits::ContentApi;
use crate::store::models::{SceneContentRecord, SceneRecord};
use crate::store::traits::SceneStore;
use crate::{Error, Result};

/// Index variant for published scenes: fetches the full entity body and
/// persists it, once, keyed by entity id.
pub struct SceneIndex {
    client: Arc<dyn ContentApi>,
    store: Arc<dyn SceneStore>,
}

impl SceneIndex {
    pub fn new(client: Arc<dyn ContentApi>, store: Arc<dyn SceneStore>) -> Self {
        Self { client, store }
    }
}

#[async_trait]
impl EntityIndex for SceneIndex {
    fn name(&self) -> &'static str {
        "scenes"
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(epoch = ctx.epoch))]
    async fn process(&self, ctx: &RunContext, entity_type: &str, entity_id: &str) -> Result<()> {
        if entity_type != ENTITY_TYPE_SCENE {
            return Ok(());
        }

        // Checked before the fetch to avoid a redundant remote call.
        if self.store.scene_exists(entity_id).await? {
            tracing::debug!(entity_id, "scene already indexed, skipping");
            return Ok(());
        }

        let entity = self.client.get_scene_entity(entity_id).await?;
        let raw = serde_json::to_value(&entity)?;

        let scene = SceneRecord {
            id: entity_id.to_string(),
            title: entity.metadata.display.title.clone(),
            pointers: entity.pointers.clone(),
            raw,
            published_at: published_at_from_millis(entity.timestamp)?,
            created_at: Utc::now(),
        };
        let contents: Vec<SceneContentRecord> = entity
            .content
            .iter()
            .map(|content| SceneContentRecord {
                hash: content.hash.clone(),
                file: content.file.clone(),
                scene_id: entity_id.to_string(),
            })
            .collect();

        self.store.insert_scene(&scene, &contents).await?;
        tracing::info!(entity_id, files = contents.len(), "scene indexed");
        Ok(())
    }
}

/// Remote publish times arrive as epoch milliseconds and are persisted at
/// second precision.
fn published_at_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(millis / 1000, 0)
        .ok_or_else(|| Error::message(format!("publish timestamp out of range: {millis}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::test_support::{scene_entity, StubContentApi};
    use crate::store::memory::MemorySceneStore;

    const CTX: RunContext = RunContext { epoch: 1 };

    fn index(api: StubContentApi, store: &MemorySceneStore) -> SceneIndex {
        SceneIndex::new(Arc::new(api), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn indexes_a_scene_with_its_content_rows() {
        let store = MemorySceneStore::new();
        let api = StubContentApi::default().with_entity(scene_entity(
            "QmA",
            1_582_223_400_000,
            &["10,-5"],
            &[("scene.json", "QmHashA"), ("model.glb", "QmHashB")],
        ));
        let index = index(api, &store);

        index.process(&CTX, "scene", "QmA").await.unwrap();

        let scene = store.scene("QmA").await.unwrap();
        assert_eq!(scene.pointers, vec!["10,-5"]);
        assert_eq!(scene.published_at.timestamp(), 1_582_223_400);
        assert_eq!(store.content_count().await, 2);
    }

    #[tokio::test]
    async fn reindexing_the_same_entity_is_a_noop() {
        let store = MemorySceneStore::new();
        let api = StubContentApi::default()
            .with_entity(scene_entity("QmA", 1_000, &["1,1"], &[("scene.json", "QmH")]));
        let fetches = api.entity_fetches();
        let index = index(api, &store);

        index.process(&CTX, "scene", "QmA").await.unwrap();
        index.process(&CTX, "scene", "QmA").await.unwrap();

        assert_eq!(store.scene_count().await, 1);
        assert_eq!(store.content_count().await, 1);
        // The second pass skipped on the existence check, before any fetch.
        assert_eq!(fetches.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unrecognized_entity_kind_is_skipped_without_writes() {
        let store = MemorySceneStore::new();
        let index = index(StubContentApi::default(), &store);

        index.process(&CTX, "profile", "QmProfile").await.unwrap();

        assert_eq!(store.scene_count().await, 0);
        assert_eq!(store.content_count().await, 0);
    }

    #[tokio::test]
    async fn missing_entity_fails_the_job() {
        let store = MemorySceneStore::new();
        let index = index(StubContentApi::default(), &store);

        let err = index.process(&CTX, "scene", "QmGone").await.unwrap_err();
        assert!(matches!(err, Error::EntityNotFound(_)));
        assert_eq!(store.scene_count().await, 0);
    }
}
