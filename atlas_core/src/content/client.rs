//! HTTP client for the content-distribution API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::instrument;

use super::models::{HistoryPage, HistoryQuery, SceneEntity, ServerStatus};
use super::traits::ContentApi;
use crate::{Error, Result};

const STATUS_PATH: &str = "/status";
const HISTORY_PATH: &str = "/history";
const SCENE_ENTITY_PATH: &str = "/entities/scene";
const CONTENT_PATH: &str = "/contents";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed [`ContentApi`] implementation.
#[derive(Debug, Clone)]
pub struct HttpContentClient {
    client: Client,
    base_url: String,
}

impl HttpContentClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::InvalidConfig(
                "content server url is empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ContentApi for HttpContentClient {
    #[instrument(level = "debug", skip(self))]
    async fn get_status(&self) -> Result<ServerStatus> {
        self.get_json(STATUS_PATH, &[]).await
    }

    #[instrument(level = "debug", skip(self, query))]
    async fn get_history_page(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        self.get_json(HISTORY_PATH, &query.query_pairs()).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_scene_entity(&self, entity_id: &str) -> Result<SceneEntity> {
        // The endpoint answers with an array even for a single-id lookup.
        let mut entities: Vec<SceneEntity> = self
            .get_json(SCENE_ENTITY_PATH, &[("id", entity_id.to_string())])
            .await?;
        if entities.is_empty() {
            return Err(Error::EntityNotFound(entity_id.to_string()));
        }
        Ok(entities.swap_remove(0))
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_content(&self, hash: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(format!("{}/{hash}", self.url(CONTENT_PATH)))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = HttpContentClient::new("https://peer.example.org/").unwrap();
        assert_eq!(client.url(STATUS_PATH), "https://peer.example.org/status");
    }

    #[test]
    fn rejects_empty_base_url() {
        assert!(matches!(
            HttpContentClient::new(""),
            Err(Error::InvalidConfig(_))
        ));
    }
}
