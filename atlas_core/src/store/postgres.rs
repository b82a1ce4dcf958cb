use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use super::models::{SceneContentRecord, ScenePointers, SceneRecord, TileRecord};
use super::traits::SceneStore;
use crate::Result;

/// Postgres-backed [`SceneStore`].
#[derive(Debug, Clone)]
pub struct PgSceneStore {
    pool: PgPool,
}

impl PgSceneStore {
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn migrate(&self) -> Result<()> {
        // Scenes are insert-once; the id is the idempotency key.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scenes (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                pointers     TEXT[] NOT NULL,
                raw          JSONB NOT NULL,
                published_at TIMESTAMPTZ NOT NULL,
                created_at   TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // The tile pass range-scans by publish time.
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS scenes_published_at_idx
              ON scenes (published_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        // One row per manifest file. The same blob may back files in many
        // scenes, so the hash alone is not a key.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scene_contents (
                hash     TEXT NOT NULL,
                file     TEXT NOT NULL,
                scene_id TEXT NOT NULL REFERENCES scenes (id),
                PRIMARY KEY (scene_id, hash, file)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS scene_contents_scene_id_idx
              ON scene_contents (scene_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tiles (
                x            INTEGER NOT NULL,
                y            INTEGER NOT NULL,
                scene_id     TEXT NOT NULL,
                published_at TIMESTAMPTZ NOT NULL,
                updated_at   TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (x, y)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SceneStore for PgSceneStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn scene_exists(&self, scene_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM scenes WHERE id = $1")
            .bind(scene_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(scene_id = %scene.id))]
    async fn insert_scene(
        &self,
        scene: &SceneRecord,
        contents: &[SceneContentRecord],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO scenes (id, title, pointers, raw, published_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&scene.id)
        .bind(&scene.title)
        .bind(&scene.pointers)
        .bind(sqlx::types::Json(&scene.raw))
        .bind(scene.published_at)
        .bind(scene.created_at)
        .execute(&mut *tx)
        .await?;

        for content in contents {
            sqlx::query(
                r#"
                INSERT INTO scene_contents (hash, file, scene_id)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(&content.hash)
            .bind(&content.file)
            .bind(&content.scene_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn scene_contents(&self, scene_id: &str) -> Result<Vec<SceneContentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT hash, file, scene_id
              FROM scene_contents
             WHERE scene_id = $1
            "#,
        )
        .bind(scene_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SceneContentRecord {
                    hash: row.try_get("hash")?,
                    file: row.try_get("file")?,
                    scene_id: row.try_get("scene_id")?,
                })
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn scenes_published_since(&self, since: DateTime<Utc>) -> Result<Vec<ScenePointers>> {
        let rows = sqlx::query(
            r#"
            SELECT id, pointers, published_at
              FROM scenes
             WHERE published_at >= $1
             ORDER BY published_at ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ScenePointers {
                    id: row.try_get("id")?,
                    pointers: row.try_get("pointers")?,
                    published_at: row.try_get("published_at")?,
                })
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(x = tile.x, y = tile.y))]
    async fn upsert_tile(&self, tile: &TileRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tiles (x, y, scene_id, published_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (x, y) DO UPDATE SET
                scene_id     = excluded.scene_id,
                published_at = excluded.published_at,
                updated_at   = excluded.updated_at
            "#,
        )
        .bind(tile.x)
        .bind(tile.y)
        .bind(&tile.scene_id)
        .bind(tile.published_at)
        .bind(tile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
