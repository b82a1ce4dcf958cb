use serde::{Deserialize, Serialize};

/// Entity kind reported by the history log for published scenes.
pub const ENTITY_TYPE_SCENE: &str = "scene";
/// Entity kind for avatar profiles. Reported by the log, not indexed.
pub const ENTITY_TYPE_PROFILE: &str = "profile";

/// Remote server status, as returned by `/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub name: String,
    pub version: String,
    pub current_time: i64,
    #[serde(default)]
    pub last_immutable_time: i64,
    #[serde(default)]
    pub history_size: i64,
    #[serde(default)]
    pub commit_hash: String,
}

/// One entry of the append-only deployment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub server_name: String,
    pub entity_type: String,
    pub entity_id: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
}

/// Pagination envelope of a history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
    pub more_data: bool,
}

/// One page of the history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub events: Vec<HistoryEntry>,
    pub pagination: Pagination,
}

/// Query parameters accepted by the history endpoint.
///
/// Only fields that are set are encoded; the server applies its own defaults
/// for the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub server_name: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl HistoryQuery {
    /// Encode the set fields as URL query pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_string()));
        }
        if let Some(server_name) = &self.server_name {
            pairs.push(("serverName", server_name.clone()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// A content file declared in a scene's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneContentFile {
    pub file: String,
    pub hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDisplay {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub favicon: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneMetadata {
    #[serde(default)]
    pub display: SceneDisplay,
}

/// Full scene entity body fetched from the content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Publish time, milliseconds since epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub pointers: Vec<String>,
    #[serde(default)]
    pub content: Vec<SceneContentFile>,
    #[serde(default)]
    pub metadata: SceneMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_encode_only_set_fields() {
        let query = HistoryQuery {
            offset: Some(200),
            server_name: Some("peer-eu1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.query_pairs(),
            vec![
                ("serverName", "peer-eu1".to_string()),
                ("offset", "200".to_string()),
            ]
        );
        assert!(HistoryQuery::default().query_pairs().is_empty());
    }

    #[test]
    fn scene_entity_parses_wire_shape() {
        let body = serde_json::json!({
            "id": "QmScene",
            "type": "scene",
            "timestamp": 1_582_223_400_000_i64,
            "pointers": ["10,-5"],
            "content": [{"file": "scene.json", "hash": "QmHash"}],
            "metadata": {"display": {"title": "Plaza", "favicon": ""}}
        });
        let entity: SceneEntity = serde_json::from_value(body).unwrap();
        assert_eq!(entity.entity_type, ENTITY_TYPE_SCENE);
        assert_eq!(entity.metadata.display.title, "Plaza");
        assert_eq!(entity.content.len(), 1);
    }
}
