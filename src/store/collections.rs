use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::{AudioFeatures, SourceCollection, Track};

/// Keyed access to track records, partitioned by collection.
///
/// Feature vectors are stored as a JSON column and deserialized on read;
/// a row whose JSON fails to parse comes back with `features: None` rather
/// than failing the whole scan.
#[derive(Debug, Clone)]
pub struct TrackStore {
    pool: Pool<Sqlite>,
}

#[derive(sqlx::FromRow)]
struct TrackRow {
    id: String,
    name: String,
    artists: String,
    album: Option<String>,
    duration_ms: i64,
    external_url: Option<String>,
    preview_url: Option<String>,
    isrc: Option<String>,
    saved: Option<bool>,
    position: Option<i64>,
    features_json: Option<String>,
}

impl TrackRow {
    fn into_track(self) -> Track {
        let features = self
            .features_json
            .as_deref()
            .and_then(|json| serde_json::from_str::<AudioFeatures>(json).ok());
        Track {
            id: self.id,
            name: self.name,
            artists: self.artists,
            album: self.album,
            duration_ms: self.duration_ms as u32,
            external_url: self.external_url,
            preview_url: self.preview_url,
            isrc: self.isrc,
            saved: self.saved,
            pinned: false,
            position: self.position.map(|p| p as u32),
            features,
        }
    }
}

const SELECT_COLUMNS: &str = "id, name, artists, album, duration_ms, external_url, \
     preview_url, isrc, saved, position, features_json";

impl TrackStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn get(
        &self,
        collection: SourceCollection,
        id: &str,
    ) -> Result<Option<Track>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM tracks WHERE collection = ? AND id = ?",
            SELECT_COLUMNS
        );
        let row: Option<TrackRow> = sqlx::query_as(&sql)
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TrackRow::into_track))
    }

    /// Upsert one record. The session-only `pinned` flag is not persisted.
    pub async fn put(&self, collection: SourceCollection, track: &Track) -> Result<(), sqlx::Error> {
        let features_json = track
            .features
            .as_ref()
            .and_then(|f| serde_json::to_string(f).ok());

        sqlx::query(
            r#"
            INSERT INTO tracks (collection, id, name, artists, album, duration_ms,
                                external_url, preview_url, isrc, saved, position,
                                features_json, imported_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET
                name = excluded.name,
                artists = excluded.artists,
                album = excluded.album,
                duration_ms = excluded.duration_ms,
                external_url = excluded.external_url,
                preview_url = excluded.preview_url,
                isrc = excluded.isrc,
                saved = excluded.saved,
                position = excluded.position,
                features_json = excluded.features_json,
                imported_at = excluded.imported_at
            "#,
        )
        .bind(collection.as_str())
        .bind(&track.id)
        .bind(&track.name)
        .bind(&track.artists)
        .bind(&track.album)
        .bind(track.duration_ms as i64)
        .bind(&track.external_url)
        .bind(&track.preview_url)
        .bind(&track.isrc)
        .bind(track.saved)
        .bind(track.position.map(|p| p as i64))
        .bind(features_json)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Bulk import into a collection, one transaction.
    pub async fn put_all(
        &self,
        collection: SourceCollection,
        tracks: &[Track],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().timestamp();

        for track in tracks {
            let features_json = track
                .features
                .as_ref()
                .and_then(|f| serde_json::to_string(f).ok());

            sqlx::query(
                r#"
                INSERT INTO tracks (collection, id, name, artists, album, duration_ms,
                                    external_url, preview_url, isrc, saved, position,
                                    features_json, imported_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    name = excluded.name,
                    artists = excluded.artists,
                    album = excluded.album,
                    duration_ms = excluded.duration_ms,
                    external_url = excluded.external_url,
                    preview_url = excluded.preview_url,
                    isrc = excluded.isrc,
                    saved = excluded.saved,
                    position = excluded.position,
                    features_json = excluded.features_json,
                    imported_at = excluded.imported_at
                "#,
            )
            .bind(collection.as_str())
            .bind(&track.id)
            .bind(&track.name)
            .bind(&track.artists)
            .bind(&track.album)
            .bind(track.duration_ms as i64)
            .bind(&track.external_url)
            .bind(&track.preview_url)
            .bind(&track.isrc)
            .bind(track.saved)
            .bind(track.position.map(|p| p as i64))
            .bind(features_json)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        log::info!(
            "Imported {} tracks into '{}'",
            tracks.len(),
            collection.as_str()
        );
        Ok(())
    }

    pub async fn delete(
        &self,
        collection: SourceCollection,
        id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracks WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop every record in a collection. Explicit user action only.
    pub async fn clear(&self, collection: SourceCollection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracks WHERE collection = ?")
            .bind(collection.as_str())
            .execute(&self.pool)
            .await?;
        let count = result.rows_affected();
        if count > 0 {
            log::info!("Cleared {} tracks from '{}'", count, collection.as_str());
        }
        Ok(count)
    }

    /// Every record in a collection; rank-ordered collections come back in
    /// rank order, the rest in name order.
    pub async fn list_all(&self, collection: SourceCollection) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM tracks WHERE collection = ? ORDER BY position, name",
            SELECT_COLUMNS
        );
        let rows: Vec<TrackRow> = sqlx::query_as(&sql)
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(TrackRow::into_track).collect())
    }

    pub async fn count(&self, collection: SourceCollection) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks WHERE collection = ?")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Write a reconciled saved flag without touching the rest of the row.
    pub async fn set_saved(
        &self,
        collection: SourceCollection,
        id: &str,
        saved: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tracks SET saved = ? WHERE collection = ? AND id = ?")
            .bind(saved)
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
