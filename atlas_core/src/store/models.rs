use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted scene. Written once per entity id, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRecord {
    pub id: String,
    pub title: String,
    /// Grid locators claimed by the scene, in manifest order.
    pub pointers: Vec<String>,
    /// The fetched entity body, re-serialized verbatim.
    pub raw: serde_json::Value,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One content file of a scene's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneContentRecord {
    pub hash: String,
    pub file: String,
    pub scene_id: String,
}

/// Projection subset of a scene used by the tile pass.
#[derive(Debug, Clone)]
pub struct ScenePointers {
    pub id: String,
    pub pointers: Vec<String>,
    pub published_at: DateTime<Utc>,
}

/// The persisted owner of one grid coordinate. Keyed by `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub x: i32,
    pub y: i32,
    pub scene_id: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
