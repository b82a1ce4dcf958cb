use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{SceneContentRecord, ScenePointers, SceneRecord, TileRecord};
use crate::Result;

/// Capability trait for the indexer's persistent store.
///
/// Implementations must be safe for concurrent use by multiple workers.
#[async_trait]
pub trait SceneStore: Send + Sync {
    /// Point lookup used as the idempotency check before fetching an entity.
    async fn scene_exists(&self, scene_id: &str) -> Result<bool>;

    /// Persist a scene and its content rows atomically.
    ///
    /// Either everything commits or nothing does; a failure on any row leaves
    /// no partial scene behind.
    async fn insert_scene(
        &self,
        scene: &SceneRecord,
        contents: &[SceneContentRecord],
    ) -> Result<()>;

    /// Content rows of an indexed scene, in insertion order.
    async fn scene_contents(&self, scene_id: &str) -> Result<Vec<SceneContentRecord>>;

    /// Scenes published at or after `since`, ordered by publish time ascending.
    ///
    /// The ascending order is load-bearing: the tile pass relies on it so that
    /// the most recently published claimant wins the final upsert.
    async fn scenes_published_since(&self, since: DateTime<Utc>) -> Result<Vec<ScenePointers>>;

    /// Insert or overwrite the tile at `(tile.x, tile.y)`.
    ///
    /// On conflict the existing owner and publish time are replaced
    /// unconditionally and `updated_at` is refreshed.
    async fn upsert_tile(&self, tile: &TileRecord) -> Result<()>;
}
