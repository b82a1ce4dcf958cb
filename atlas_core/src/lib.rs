//! Atlas core library: remote content API client, scene store, and the
//! periodic indexing engine that ties them together.

#![forbid(unsafe_code)]

mod error;

pub mod content;
pub mod indexer;
pub mod store;

pub use content::client::HttpContentClient;
pub use content::models::{
    HistoryEntry, HistoryPage, HistoryQuery, Pagination, SceneEntity, ServerStatus,
    ENTITY_TYPE_PROFILE, ENTITY_TYPE_SCENE,
};
pub use content::traits::ContentApi;
pub use error::{Error, Result};
pub use indexer::engine::{ContentIndexer, IndexerConfig};
pub use indexer::models::{Job, RunContext};
pub use indexer::scene::SceneIndex;
pub use indexer::tiles::TileProjector;
pub use indexer::traits::EntityIndex;
pub use store::memory::MemorySceneStore;
pub use store::models::{SceneContentRecord, ScenePointers, SceneRecord, TileRecord};
pub use store::postgres::PgSceneStore;
pub use store::traits::SceneStore;
