//! Local collection store.
//!
//! SQLite-backed keyed storage for track records, partitioned into named
//! collections (library, top tracks, recommendations, demo tracks). The
//! pool is created once at startup and handed to whoever needs it; every
//! write is keyed by (collection, id) so writes to different keys never
//! conflict.

mod collections;
mod demo;

pub use collections::TrackStore;
pub use demo::seed_demo_tracks;

use std::fs;
use std::path::Path;

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

pub struct StoreManager {
    pub pool: Pool<Sqlite>,
}

impl StoreManager {
    /// Open (or create) the on-disk store under `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self, sqlx::Error> {
        if !data_dir.exists() {
            fs::create_dir_all(data_dir).map_err(|e| sqlx::Error::Io(e))?;
        }

        let db_path = data_dir.join("collections.db");
        log::info!("Opening collection store at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&db_path)
                    .create_if_missing(true),
            )
            .await?;

        Self::apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory store, used by tests. One connection so every handle sees
    /// the same database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn apply_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
        let schema = include_str!("schema.sql");
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(pool).await?;
            }
        }
        Ok(())
    }

    pub fn tracks(&self) -> TrackStore {
        TrackStore::new(self.pool.clone())
    }
}
