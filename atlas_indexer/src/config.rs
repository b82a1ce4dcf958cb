use std::time::Duration;

use anyhow::Context;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub content_server_url: String,
    pub workers: usize,
    pub interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let content_server_url =
            std::env::var("CONTENT_SERVER_URL").context("CONTENT_SERVER_URL is not set")?;

        let workers = match std::env::var("ATLAS_INDEX_WORKERS") {
            Ok(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|w| *w > 0)
                .with_context(|| format!("ATLAS_INDEX_WORKERS must be a positive integer, got {raw:?}"))?,
            Err(_) => DEFAULT_WORKERS,
        };

        let interval_secs = match std::env::var("ATLAS_INDEX_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .with_context(|| {
                    format!("ATLAS_INDEX_INTERVAL_SECS must be a positive integer, got {raw:?}")
                })?,
            Err(_) => DEFAULT_INTERVAL_SECS,
        };

        Ok(Self {
            database_url,
            content_server_url,
            workers,
            interval: Duration::from_secs(interval_secs),
        })
    }
}
