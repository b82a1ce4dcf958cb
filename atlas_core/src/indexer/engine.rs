use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::models::{HistoryCursor, Job, RunContext};
use super::pool::WorkerPool;
use super::tiles::TileProjector;
use super::traits::EntityIndex;
use crate::content::traits::ContentApi;
use crate::store::traits::SceneStore;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Number of concurrent index workers. Also the job queue capacity.
    pub workers: usize,
    /// Pause between the end of one epoch and the start of the next.
    pub interval: Duration,
}

/// The indexing orchestrator.
///
/// Each epoch replays the full remote history through the worker pool, waits
/// for the pool to drain, then reprojects the tile grid. Epoch failures are
/// logged and retried on the next scheduled epoch; there are no in-epoch
/// retries.
pub struct ContentIndexer {
    client: Arc<dyn ContentApi>,
    indexes: Arc<Vec<Arc<dyn EntityIndex>>>,
    projector: TileProjector,
    config: IndexerConfig,
}

impl std::fmt::Debug for ContentIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentIndexer")
            .field("indexes", &self.indexes.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContentIndexer {
    pub fn new(
        client: Arc<dyn ContentApi>,
        store: Arc<dyn SceneStore>,
        indexes: Vec<Arc<dyn EntityIndex>>,
        config: IndexerConfig,
    ) -> Result<Self> {
        if config.workers == 0 {
            return Err(Error::InvalidConfig(
                "worker count must be > 0".to_string(),
            ));
        }
        if config.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "index interval must be > 0".to_string(),
            ));
        }
        Ok(Self {
            client,
            indexes: Arc::new(indexes),
            projector: TileProjector::new(store),
            config,
        })
    }

    /// Run epochs until `cancel` fires.
    ///
    /// The first epoch starts immediately; each subsequent epoch starts one
    /// interval after the previous one finished. Cancellation is observed
    /// while sleeping and between history pages; in-flight jobs are allowed
    /// to finish.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn run(&self, cancel: CancellationToken) {
        let mut epoch = 0u64;
        loop {
            if cancel.is_cancelled() {
                tracing::info!("indexer shut down");
                return;
            }

            epoch += 1;
            let ctx = RunContext { epoch };
            tracing::info!(epoch, "starting index epoch");
            match self.run_epoch(ctx, &cancel).await {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    tracing::info!(epoch, "epoch interrupted by shutdown");
                }
                Err(error) => {
                    tracing::error!(epoch, error = %error, "index epoch failed");
                }
            }

            let deadline = tokio::time::Instant::now() + self.config.interval;
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("indexer shut down");
                    return;
                }
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }
    }

    async fn run_epoch(&self, ctx: RunContext, cancel: &CancellationToken) -> Result<()> {
        tracing::debug!(
            epoch = ctx.epoch,
            workers = self.config.workers,
            "starting workers"
        );
        let pool = WorkerPool::start(ctx, self.config.workers, Arc::clone(&self.indexes));

        // Drain the pool even when the walk fails: queued jobs are still
        // delivered, and workers must exit before the epoch ends.
        let replayed = self.replay_history(ctx, cancel, &pool).await;
        tracing::debug!(epoch = ctx.epoch, "waiting for workers");
        pool.close_and_drain().await;
        let dispatched = replayed?;

        // Full reprojection: the watermark stays at the epoch origin.
        let tiles = self
            .projector
            .project(&ctx, DateTime::<Utc>::UNIX_EPOCH)
            .await?;
        tracing::info!(epoch = ctx.epoch, dispatched, tiles, "epoch complete");
        Ok(())
    }

    /// Walk the history log from offset 0, enqueueing one job per entry.
    async fn replay_history(
        &self,
        ctx: RunContext,
        cancel: &CancellationToken,
        pool: &WorkerPool,
    ) -> Result<u64> {
        let mut cursor = HistoryCursor::default();
        let mut dispatched = 0u64;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            tracing::debug!(
                epoch = ctx.epoch,
                offset = cursor.offset(),
                "fetching history page"
            );
            let page = self.client.get_history_page(&cursor.query()).await?;

            tracing::debug!(epoch = ctx.epoch, entries = page.events.len(), "dispatching");
            for entry in &page.events {
                pool.dispatch(Job::from(entry)).await?;
                dispatched += 1;
            }

            if !cursor.advance(&page.pagination) {
                return Ok(dispatched);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::models::ENTITY_TYPE_SCENE;
    use crate::indexer::scene::SceneIndex;
    use crate::indexer::test_support::{
        history_entry, scene_entity, CountingIndex, StubContentApi,
    };
    use crate::store::memory::MemorySceneStore;

    fn config() -> IndexerConfig {
        IndexerConfig {
            workers: 2,
            interval: Duration::from_secs(60),
        }
    }

    fn counting_indexer(
        api: StubContentApi,
        counting: Arc<CountingIndex>,
        workers: usize,
    ) -> ContentIndexer {
        ContentIndexer::new(
            Arc::new(api),
            Arc::new(MemorySceneStore::new()),
            vec![counting],
            IndexerConfig {
                workers,
                interval: Duration::from_secs(60),
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_workers_and_zero_interval() {
        let api = Arc::new(StubContentApi::default());
        let store = Arc::new(MemorySceneStore::new());

        let err = ContentIndexer::new(
            api.clone(),
            store.clone(),
            vec![],
            IndexerConfig {
                workers: 0,
                interval: Duration::from_secs(60),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = ContentIndexer::new(
            api,
            store,
            vec![],
            IndexerConfig {
                workers: 2,
                interval: Duration::ZERO,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn dispatches_every_entry_regardless_of_page_size() {
        let entries: Vec<_> = (0..7)
            .map(|i| history_entry(ENTITY_TYPE_SCENE, &format!("Qm{i}")))
            .collect();

        for page_size in [1, 3, 7, 100] {
            let counting = Arc::new(CountingIndex::default());
            let api = StubContentApi::default().with_history(entries.clone(), page_size);
            let indexer = counting_indexer(api, counting.clone(), 2);

            indexer
                .run_epoch(RunContext { epoch: 1 }, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(counting.calls(), 7, "page_size = {page_size}");
        }
    }

    #[tokio::test]
    async fn empty_history_terminates_with_zero_jobs() {
        let counting = Arc::new(CountingIndex::default());
        let api = StubContentApi::default().with_history(vec![], 10);
        let indexer = counting_indexer(api, counting.clone(), 4);

        indexer
            .run_epoch(RunContext { epoch: 1 }, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(counting.calls(), 0);
    }

    #[tokio::test]
    async fn cancelled_epoch_stops_the_history_walk() {
        let entries = vec![history_entry(ENTITY_TYPE_SCENE, "QmA")];
        let counting = Arc::new(CountingIndex::default());
        let api = StubContentApi::default().with_history(entries, 1);
        let indexer = counting_indexer(api, counting, 1);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = indexer
            .run_epoch(RunContext { epoch: 1 }, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn epoch_indexes_scenes_and_projects_tiles() {
        let entries = vec![
            history_entry(ENTITY_TYPE_SCENE, "QmOld"),
            history_entry("profile", "QmProfile"),
            history_entry(ENTITY_TYPE_SCENE, "QmNew"),
        ];
        let api = StubContentApi::default()
            .with_history(entries, 2)
            .with_entity(scene_entity("QmOld", 1_000, &["3,4"], &[]))
            .with_entity(scene_entity(
                "QmNew",
                2_000,
                &["3,4", "5,6"],
                &[("scene.json", "QmHash")],
            ));
        let store = MemorySceneStore::new();

        let client: Arc<dyn ContentApi> = Arc::new(api);
        let store_arc: Arc<dyn SceneStore> = Arc::new(store.clone());
        let scene_index = Arc::new(SceneIndex::new(client.clone(), store_arc.clone()));
        let indexer =
            ContentIndexer::new(client, store_arc, vec![scene_index], config()).unwrap();

        indexer
            .run_epoch(RunContext { epoch: 1 }, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(store.scene_count().await, 2);
        assert_eq!(store.content_count().await, 1);
        assert_eq!(store.tile(3, 4).await.unwrap().scene_id, "QmNew");
        assert_eq!(store.tile(5, 6).await.unwrap().scene_id, "QmNew");
    }

    #[tokio::test]
    async fn run_returns_promptly_when_cancelled() {
        let api = StubContentApi::default().with_history(vec![], 10);
        let counting = Arc::new(CountingIndex::default());
        let indexer = counting_indexer(api, counting, 1);

        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), indexer.run(cancel))
            .await
            .expect("run should observe cancellation");
    }
}
