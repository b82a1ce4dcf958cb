use async_trait::async_trait;
use bytes::Bytes;

use super::models::{HistoryPage, HistoryQuery, SceneEntity, ServerStatus};
use crate::Result;

/// Capability trait for the remote content-distribution API.
///
/// The production implementation is [`HttpContentClient`](super::client::HttpContentClient);
/// tests script responses through a stub.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Fetch the remote server's status.
    async fn get_status(&self) -> Result<ServerStatus>;

    /// Fetch one page of the deployment history.
    async fn get_history_page(&self, query: &HistoryQuery) -> Result<HistoryPage>;

    /// Fetch a scene entity by id.
    ///
    /// Returns [`Error::EntityNotFound`](crate::Error::EntityNotFound) when the
    /// content store no longer serves the entity.
    async fn get_scene_entity(&self, entity_id: &str) -> Result<SceneEntity>;

    /// Fetch a raw content blob by hash.
    async fn get_content(&self, hash: &str) -> Result<Bytes>;
}
