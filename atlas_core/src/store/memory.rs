use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::models::{SceneContentRecord, ScenePointers, SceneRecord, TileRecord};
use super::traits::SceneStore;
use crate::{Error, Result};

#[derive(Default)]
struct Inner {
    scenes: HashMap<String, SceneRecord>,
    contents: Vec<SceneContentRecord>,
    tiles: HashMap<(i32, i32), TileRecord>,
}

/// In-memory [`SceneStore`] for local development and unit tests.
#[derive(Clone, Default)]
pub struct MemorySceneStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the tile at `(x, y)`, if any (primarily for tests).
    pub async fn tile(&self, x: i32, y: i32) -> Option<TileRecord> {
        self.inner.lock().await.tiles.get(&(x, y)).cloned()
    }

    pub async fn scene(&self, scene_id: &str) -> Option<SceneRecord> {
        self.inner.lock().await.scenes.get(scene_id).cloned()
    }

    pub async fn scene_count(&self) -> usize {
        self.inner.lock().await.scenes.len()
    }

    pub async fn content_count(&self) -> usize {
        self.inner.lock().await.contents.len()
    }

    pub async fn tile_count(&self) -> usize {
        self.inner.lock().await.tiles.len()
    }
}

#[async_trait]
impl SceneStore for MemorySceneStore {
    async fn scene_exists(&self, scene_id: &str) -> Result<bool> {
        Ok(self.inner.lock().await.scenes.contains_key(scene_id))
    }

    async fn insert_scene(
        &self,
        scene: &SceneRecord,
        contents: &[SceneContentRecord],
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        // Mirror the primary-key discipline of the Postgres store: both the
        // scene row and its content rows land together or not at all.
        if inner.scenes.contains_key(&scene.id) {
            return Err(Error::Conflict(format!(
                "scene already indexed: {}",
                scene.id
            )));
        }
        for content in contents {
            let duplicate = inner.contents.iter().any(|existing| {
                existing.scene_id == content.scene_id
                    && existing.hash == content.hash
                    && existing.file == content.file
            });
            if duplicate {
                return Err(Error::Conflict(format!(
                    "duplicate content row: {}/{}",
                    content.scene_id, content.file
                )));
            }
        }
        inner.scenes.insert(scene.id.clone(), scene.clone());
        inner.contents.extend_from_slice(contents);
        Ok(())
    }

    async fn scene_contents(&self, scene_id: &str) -> Result<Vec<SceneContentRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .contents
            .iter()
            .filter(|content| content.scene_id == scene_id)
            .cloned()
            .collect())
    }

    async fn scenes_published_since(&self, since: DateTime<Utc>) -> Result<Vec<ScenePointers>> {
        let inner = self.inner.lock().await;
        let mut scenes: Vec<ScenePointers> = inner
            .scenes
            .values()
            .filter(|scene| scene.published_at >= since)
            .map(|scene| ScenePointers {
                id: scene.id.clone(),
                pointers: scene.pointers.clone(),
                published_at: scene.published_at,
            })
            .collect();
        scenes.sort_by_key(|scene| scene.published_at);
        Ok(scenes)
    }

    async fn upsert_tile(&self, tile: &TileRecord) -> Result<()> {
        self.inner
            .lock()
            .await
            .tiles
            .insert((tile.x, tile.y), tile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, published_at: DateTime<Utc>) -> SceneRecord {
        SceneRecord {
            id: id.to_string(),
            title: id.to_string(),
            pointers: vec![],
            raw: serde_json::json!({}),
            published_at,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_scene_rejects_duplicate_id_without_partial_write() {
        let store = MemorySceneStore::new();
        let first = scene("QmA", Utc::now());
        store.insert_scene(&first, &[]).await.unwrap();

        let contents = vec![SceneContentRecord {
            hash: "QmHash".to_string(),
            file: "scene.json".to_string(),
            scene_id: "QmA".to_string(),
        }];
        let err = store.insert_scene(&first, &contents).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.content_count().await, 0);
    }

    #[tokio::test]
    async fn scenes_published_since_orders_ascending() {
        let store = MemorySceneStore::new();
        let base = Utc::now();
        store
            .insert_scene(&scene("newer", base + chrono::Duration::seconds(10)), &[])
            .await
            .unwrap();
        store.insert_scene(&scene("older", base), &[]).await.unwrap();

        let scenes = store
            .scenes_published_since(DateTime::<Utc>::UNIX_EPOCH)
            .await
            .unwrap();
        let ids: Vec<&str> = scenes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["older", "newer"]);
    }
}
