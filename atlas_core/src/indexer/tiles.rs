use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::coords::parse_locator;
use super::models::RunContext;
use crate::store::models::TileRecord;
use crate::store::traits::SceneStore;
use crate::Result;

/// Recomputes the tile grid from scenes published since a watermark.
///
/// Scenes are iterated in ascending publish order, so for contested
/// coordinates the most recently published scene lands last and wins the
/// unconditional upsert.
pub struct TileProjector {
    store: Arc<dyn SceneStore>,
}

impl TileProjector {
    pub fn new(store: Arc<dyn SceneStore>) -> Self {
        Self { store }
    }

    /// Project tiles for every scene published at or after `since`.
    ///
    /// Per-locator and per-tile failures are logged and skipped; only the
    /// initial scene query can fail the pass. Returns the number of tiles
    /// written.
    #[tracing::instrument(level = "debug", skip(self, ctx), fields(epoch = ctx.epoch))]
    pub async fn project(&self, ctx: &RunContext, since: DateTime<Utc>) -> Result<u64> {
        let scenes = self.store.scenes_published_since(since).await?;
        tracing::info!(scenes = scenes.len(), "updating scene tiles");

        let mut written = 0u64;
        for scene in &scenes {
            for locator in &scene.pointers {
                let (x, y) = match parse_locator(locator) {
                    Ok(coords) => coords,
                    Err(error) => {
                        tracing::warn!(
                            scene_id = %scene.id,
                            locator = %locator,
                            error = %error,
                            "skipping malformed locator"
                        );
                        continue;
                    }
                };

                let tile = TileRecord {
                    x,
                    y,
                    scene_id: scene.id.clone(),
                    published_at: scene.published_at,
                    updated_at: Utc::now(),
                };
                if let Err(error) = self.store.upsert_tile(&tile).await {
                    tracing::warn!(
                        scene_id = %scene.id,
                        x,
                        y,
                        error = %error,
                        "tile upsert failed"
                    );
                    continue;
                }
                written += 1;
            }
        }

        Ok(written)
    }
}
