//! Metadata enrichment: attach feature vectors and preview URLs to stored
//! tracks via MusicBrainz, AcousticBrainz and Deezer.
//!
//! Runs as a best-effort pipeline: individual lookup failures are logged
//! and skipped so one flaky batch doesn't sink a whole import.

pub mod acousticbrainz;
pub mod deezer;
pub mod musicbrainz;

pub use acousticbrainz::AcousticBrainzClient;
pub use deezer::DeezerClient;
pub use musicbrainz::MusicBrainzClient;

use std::time::Duration;

use thiserror::Error;

use crate::models::SourceCollection;
use crate::store::TrackStore;

/// Delay between individual Deezer search calls to avoid rate limits.
const SEARCH_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        MetadataError::Network(e.to_string())
    }
}

impl From<sqlx::Error> for MetadataError {
    fn from(e: sqlx::Error) -> Self {
        MetadataError::Store(e.to_string())
    }
}

pub struct MetadataEnricher {
    musicbrainz: MusicBrainzClient,
    acousticbrainz: AcousticBrainzClient,
    deezer: DeezerClient,
}

impl MetadataEnricher {
    pub fn new() -> Self {
        Self {
            musicbrainz: MusicBrainzClient::new(),
            acousticbrainz: AcousticBrainzClient::new(),
            deezer: DeezerClient::new(),
        }
    }

    /// Fill in missing feature vectors and preview URLs for one collection.
    /// Returns how many tracks were updated.
    pub async fn enrich_collection(
        &self,
        store: &TrackStore,
        collection: SourceCollection,
    ) -> Result<usize, MetadataError> {
        let tracks = store.list_all(collection).await?;

        let pending: Vec<_> = tracks
            .into_iter()
            .filter(|t| t.features.is_none() && t.isrc.is_some())
            .collect();
        if pending.is_empty() {
            log::info!("Nothing to enrich in '{}'", collection.as_str());
            return Ok(0);
        }
        log::info!(
            "Enriching {} tracks in '{}'",
            pending.len(),
            collection.as_str()
        );

        // ISRC → recording MBID, then MBID → feature documents.
        let isrcs: Vec<String> = pending.iter().filter_map(|t| t.isrc.clone()).collect();
        let mbids_by_isrc = self.musicbrainz.lookup_isrcs(&isrcs).await;

        let mbids: Vec<String> = mbids_by_isrc.values().cloned().collect();
        let features_by_mbid = self.acousticbrainz.features_for(&mbids).await;

        let mut updated = 0usize;
        for mut track in pending {
            let features = track
                .isrc
                .as_ref()
                .and_then(|isrc| mbids_by_isrc.get(isrc))
                .and_then(|mbid| features_by_mbid.get(mbid))
                .cloned();

            let mut changed = false;
            if let Some(features) = features {
                track.features = Some(features);
                changed = true;
            }

            if track.preview_url.is_none() {
                tokio::time::sleep(SEARCH_DELAY).await;
                match self.deezer.search_preview(&track.name, &track.artists).await {
                    Ok(Some(url)) => {
                        track.preview_url = Some(url);
                        changed = true;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::debug!("Preview search failed for '{}': {}", track.name, e);
                    }
                }
            }

            if changed {
                store.put(collection, &track).await?;
                updated += 1;
            }
        }

        log::info!("Enriched {} tracks in '{}'", updated, collection.as_str());
        Ok(updated)
    }
}

impl Default for MetadataEnricher {
    fn default() -> Self {
        Self::new()
    }
}

/// Join ids into a single query-parameter value.
pub(crate) fn join_ids(ids: &[String], sep: char) -> String {
    ids.iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}
