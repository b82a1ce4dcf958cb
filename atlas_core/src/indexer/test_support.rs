#![cfg(test)]

//! Scripted doubles shared by the indexer unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::models::RunContext;
use super::traits::EntityIndex;
use crate::content::models::{
    HistoryEntry, HistoryPage, HistoryQuery, Pagination, SceneContentFile, SceneDisplay,
    SceneEntity, SceneMetadata, ServerStatus, ENTITY_TYPE_SCENE,
};
use crate::content::traits::ContentApi;
use crate::{Error, Result};

pub(crate) fn history_entry(entity_type: &str, entity_id: &str) -> HistoryEntry {
    HistoryEntry {
        server_name: "peer-test".to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        timestamp: 0,
    }
}

pub(crate) fn scene_entity(
    id: &str,
    timestamp_millis: i64,
    pointers: &[&str],
    contents: &[(&str, &str)],
) -> SceneEntity {
    SceneEntity {
        id: id.to_string(),
        entity_type: ENTITY_TYPE_SCENE.to_string(),
        timestamp: timestamp_millis,
        pointers: pointers.iter().map(|p| p.to_string()).collect(),
        content: contents
            .iter()
            .map(|(file, hash)| SceneContentFile {
                file: file.to_string(),
                hash: hash.to_string(),
            })
            .collect(),
        metadata: SceneMetadata {
            display: SceneDisplay {
                title: format!("{id} title"),
                favicon: String::new(),
            },
        },
    }
}

/// Scripted [`ContentApi`]: history pages keyed by offset, entities and blobs
/// keyed by id/hash.
#[derive(Default)]
pub(crate) struct StubContentApi {
    pages: HashMap<u64, HistoryPage>,
    entities: HashMap<String, SceneEntity>,
    blobs: HashMap<String, Bytes>,
    entity_fetches: Arc<AtomicUsize>,
}

impl StubContentApi {
    /// Script a history of `entries` split into pages of `page_size`.
    pub(crate) fn with_history(mut self, entries: Vec<HistoryEntry>, page_size: u64) -> Self {
        assert!(page_size > 0);
        self.pages.clear();
        let total = entries.len() as u64;
        let mut chunks: Vec<Vec<HistoryEntry>> = entries
            .chunks(page_size as usize)
            .map(|chunk| chunk.to_vec())
            .collect();
        if chunks.is_empty() {
            chunks.push(Vec::new());
        }
        let last = chunks.len() - 1;
        for (i, events) in chunks.into_iter().enumerate() {
            let offset = i as u64 * page_size;
            self.pages.insert(
                offset,
                HistoryPage {
                    events,
                    pagination: Pagination {
                        offset,
                        limit: page_size,
                        more_data: i < last,
                    },
                },
            );
        }
        debug_assert!(total == 0 || self.pages.len() as u64 == total.div_ceil(page_size));
        self
    }

    pub(crate) fn with_entity(mut self, entity: SceneEntity) -> Self {
        self.entities.insert(entity.id.clone(), entity);
        self
    }

    pub(crate) fn with_blob(mut self, hash: &str, bytes: &[u8]) -> Self {
        self.blobs
            .insert(hash.to_string(), Bytes::copy_from_slice(bytes));
        self
    }

    pub(crate) fn entity_fetches(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.entity_fetches)
    }
}

#[async_trait]
impl ContentApi for StubContentApi {
    async fn get_status(&self) -> Result<ServerStatus> {
        Ok(ServerStatus {
            name: "peer-test".to_string(),
            version: "v1".to_string(),
            current_time: 0,
            last_immutable_time: 0,
            history_size: 0,
            commit_hash: String::new(),
        })
    }

    async fn get_history_page(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        let offset = query.offset.unwrap_or(0);
        self.pages
            .get(&offset)
            .cloned()
            .ok_or_else(|| Error::message(format!("no page scripted at offset {offset}")))
    }

    async fn get_scene_entity(&self, entity_id: &str) -> Result<SceneEntity> {
        self.entity_fetches.fetch_add(1, Ordering::SeqCst);
        self.entities
            .get(entity_id)
            .cloned()
            .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))
    }

    async fn get_content(&self, hash: &str) -> Result<Bytes> {
        self.blobs
            .get(hash)
            .cloned()
            .ok_or_else(|| Error::EntityNotFound(hash.to_string()))
    }
}

/// Index that counts how many jobs reached it.
#[derive(Default)]
pub(crate) struct CountingIndex {
    calls: AtomicUsize,
}

impl CountingIndex {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityIndex for CountingIndex {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn process(&self, _ctx: &RunContext, _entity_type: &str, _entity_id: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Index that fails every job.
pub(crate) struct FailingIndex;

#[async_trait]
impl EntityIndex for FailingIndex {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn process(&self, _ctx: &RunContext, _entity_type: &str, _entity_id: &str) -> Result<()> {
        Err(Error::message("scripted failure"))
    }
}
