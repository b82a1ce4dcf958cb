mod cli;
mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use atlas_core::{
    ContentApi, ContentIndexer, HttpContentClient, IndexerConfig, PgSceneStore, SceneIndex,
    SceneStore,
};
use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Migrate => {
            let store = PgSceneStore::connect(&config.database_url).await?;
            store.migrate().await?;
            tracing::info!("schema migrations applied");
            Ok(())
        }
        Commands::FetchScene { entity_id, out } => fetch_scene(config, &entity_id, &out).await,
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn SceneStore> =
        Arc::new(PgSceneStore::connect(&config.database_url).await?);
    let client: Arc<dyn ContentApi> =
        Arc::new(HttpContentClient::new(&config.content_server_url)?);

    // Startup probe: fail fast when the content server is unreachable.
    let status = client.get_status().await?;
    tracing::info!(
        server = %status.name,
        version = %status.version,
        "connected to content server"
    );

    let scene_index = Arc::new(SceneIndex::new(Arc::clone(&client), Arc::clone(&store)));
    let indexer = ContentIndexer::new(
        client,
        store,
        vec![scene_index],
        IndexerConfig {
            workers: config.workers,
            interval: config.interval,
        },
    )?;

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    indexer.run(cancel).await;
    Ok(())
}

async fn fetch_scene(
    config: Config,
    entity_id: &str,
    out: &std::path::Path,
) -> anyhow::Result<()> {
    let store = PgSceneStore::connect(&config.database_url).await?;
    let client = HttpContentClient::new(&config.content_server_url)?;

    let contents = store.scene_contents(entity_id).await?;
    if contents.is_empty() {
        anyhow::bail!("scene not indexed (or has no content files): {entity_id}");
    }

    for content in contents {
        let data = client.get_content(&content.hash).await?;
        let path = out.join(entity_id).join(&content.file);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(file = %content.file, bytes = data.len(), "downloaded");
    }
    Ok(())
}

/// Cancel the token on SIGINT or SIGTERM.
fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate_signal() => {}
        }
        tracing::info!("shutting down gracefully");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            term.recv().await;
        }
        Err(error) => {
            tracing::error!(error = %error, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}
