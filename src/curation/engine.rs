//! Curation engine implementation.
//!
//! Runs one search as a strictly sequential pipeline:
//! 1. Scan the source collection with the feature matcher
//! 2. Downsample to the target when oversized
//! 3. Reconcile saved status against the streaming service
//! 4. Assemble the playlist around pinned carry-overs
//!
//! Failures are handled at the boundary where each external call is made:
//! a store read error fails the search (and clears derived state), a sync
//! failure degrades it, an empty result is a designed state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::curation::assembler::assemble;
use crate::curation::errors::CurationError;
use crate::curation::matcher;
use crate::curation::sampler;
use crate::curation::types::{CurationSession, FilterSpec, SearchOutcome};
use crate::models::{SourceCollection, Track};
use crate::providers::StreamingService;
use crate::store::TrackStore;

/// Per-request id cap on the service's bulk saved-status endpoint.
const SAVED_BATCH_SIZE: usize = 50;

/// Per-request URI cap when adding tracks to a playlist.
const PLAYLIST_ADD_LIMIT: usize = 100;

/// Engine for filtering collections and assembling playlists.
///
/// Holds the collection store, the streaming-service seam, and the RNG the
/// sampler draws from. Created once and shared; all methods take `&self`.
pub struct CurationEngine {
    store: TrackStore,
    service: Arc<dyn StreamingService>,
    rng: Mutex<StdRng>,
}

impl CurationEngine {
    pub fn new(store: TrackStore, service: Arc<dyn StreamingService>) -> Self {
        Self {
            store,
            service,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Engine with a seeded RNG, for reproducible sampling.
    pub fn with_seed(store: TrackStore, service: Arc<dyn StreamingService>, seed: u64) -> Self {
        Self {
            store,
            service,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Run one search against `session`, replacing its playlist and match
    /// pool. On a store failure the session's derived state is cleared and
    /// the error propagated; a sync failure only degrades the outcome.
    pub async fn run_search(
        &self,
        session: &mut CurationSession,
        spec: &FilterSpec,
    ) -> Result<SearchOutcome, CurationError> {
        spec.validate()?;

        let (total, mut matched) = match self.filter_collection(spec).await {
            Ok(result) => result,
            Err(e) => {
                session.reset();
                return Err(e);
            }
        };

        let synced = if self.service.is_authenticated() {
            match self.sync_saved_status(spec.source, &mut matched).await {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Saved-status sync failed: {}; proceeding with unsynced data", e);
                    false
                }
            }
        } else {
            log::debug!("Not authenticated; skipping saved-status sync");
            false
        };

        // Eviction must land before assembly: the saved-tracks source's
        // truth is the service, and assembly dedupes against what is left.
        if spec.source == SourceCollection::Library {
            self.evict_unsaved(&mut matched).await;
        }

        let result = assemble(&session.playlist, matched, spec.target);

        if result.playlist.is_empty() {
            log::info!("No matches in '{}' for the current filter", spec.source.as_str());
            session.reset();
            return Ok(SearchOutcome {
                total_matches: total,
                playlist_len: 0,
                pool_len: 0,
                synced,
            });
        }

        session.playlist = result.playlist;
        session.pool = result.pool;
        session.last_filter = Some(spec.clone());

        let outcome = SearchOutcome {
            total_matches: total,
            playlist_len: session.playlist.len(),
            pool_len: session.pool.len(),
            synced,
        };
        log::info!(
            "Search done: {} matched, playlist {}, pool {}",
            outcome.total_matches,
            outcome.playlist_len,
            outcome.pool_len
        );
        Ok(outcome)
    }

    /// Scan a collection once, returning the accurate total match count and
    /// the (possibly downsampled) matched set.
    async fn filter_collection(
        &self,
        spec: &FilterSpec,
    ) -> Result<(usize, Vec<Track>), CurationError> {
        let records = self.store.list_all(spec.source).await?;
        let scanned = records.len();

        let matched: Vec<Track> = records
            .into_iter()
            .filter(|t| matcher::matches(t, spec))
            .collect();
        let total = matched.len();
        log::debug!(
            "Scanned {} records in '{}', {} matched",
            scanned,
            spec.source.as_str(),
            total
        );

        let matched = if total > spec.target {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            sampler::sample(matched, spec.target, &mut *rng)
        } else {
            matched
        };

        Ok((total, matched))
    }

    /// Reconcile each track's saved flag against the service, in sequential
    /// batches of [`SAVED_BATCH_SIZE`]. A failed batch aborts the rest but
    /// does not roll back flags already applied.
    async fn sync_saved_status(
        &self,
        source: SourceCollection,
        tracks: &mut [Track],
    ) -> Result<(), CurationError> {
        let total = tracks.len();
        for batch in tracks.chunks_mut(SAVED_BATCH_SIZE) {
            let ids: Vec<String> = batch.iter().map(|t| t.id.clone()).collect();
            let statuses = self
                .service
                .contains_saved(&ids)
                .await
                .map_err(|e| CurationError::Sync(e.to_string()))?;

            // The bulk endpoint answers positionally; anything other than a
            // 1:1 response would silently corrupt the pairing below.
            if statuses.len() != ids.len() {
                return Err(CurationError::Sync(format!(
                    "saved-status response has {} entries for {} ids",
                    statuses.len(),
                    ids.len()
                )));
            }

            for (track, saved) in batch.iter_mut().zip(statuses) {
                track.saved = Some(saved);
                if let Err(e) = self.store.set_saved(source, &track.id, saved).await {
                    log::warn!("Could not persist saved flag for {}: {}", track.id, e);
                }
            }
        }
        log::debug!("Saved-status sync complete for {} tracks", total);
        Ok(())
    }

    /// Drop candidates the service says are no longer saved, and delete
    /// their rows; they no longer belong to the saved-tracks collection.
    async fn evict_unsaved(&self, matched: &mut Vec<Track>) {
        let evicted: Vec<Track> = matched
            .iter()
            .filter(|t| t.saved == Some(false))
            .cloned()
            .collect();
        if evicted.is_empty() {
            return;
        }

        matched.retain(|t| t.saved != Some(false));
        for track in &evicted {
            if let Err(e) = self.store.delete(SourceCollection::Library, &track.id).await {
                log::warn!("Could not evict unsaved track {}: {}", track.id, e);
            }
        }
        log::info!("Evicted {} unsaved tracks from the library source", evicted.len());
    }

    /// Replace the first `drop_count` pool entries with fresh matches from
    /// a rescan of the source. Tracks already in the playlist or pool
    /// (including the ones just dropped) are not offered again.
    pub async fn refresh_pool(
        &self,
        session: &mut CurationSession,
        drop_count: usize,
    ) -> Result<usize, CurationError> {
        let Some(spec) = session.last_filter.clone() else {
            return Ok(0);
        };

        let known: HashSet<String> = session
            .playlist
            .iter()
            .chain(session.pool.iter())
            .map(|t| t.id.clone())
            .collect();

        let dropped = drop_count.min(session.pool.len());
        session.pool.drain(..dropped);

        let records = self.store.list_all(spec.source).await?;
        let fresh: Vec<Track> = records
            .into_iter()
            .filter(|t| matcher::matches(t, &spec) && !known.contains(&t.id))
            .collect();

        let replenished = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            sampler::sample(fresh, drop_count, &mut *rng)
        };
        let count = replenished.len();
        session.pool.extend(replenished);

        log::debug!("Pool refresh: dropped {}, added {}", dropped, count);
        Ok(count)
    }

    /// Publish the session's playlist to the streaming service. Creation
    /// failure aborts before any track-add call; adds are chunked to the
    /// service's per-request cap and issued sequentially.
    pub async fn publish(
        &self,
        session: &CurationSession,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<String, CurationError> {
        if session.playlist.is_empty() {
            return Err(CurationError::Publish("playlist is empty".to_string()));
        }
        if !self.service.is_authenticated() {
            return Err(CurationError::NotAuthenticated);
        }

        let playlist_id = self
            .service
            .create_playlist(name, description, public)
            .await
            .map_err(|e| CurationError::Publish(e.to_string()))?;

        let uris: Vec<String> = session.playlist.iter().map(Track::uri).collect();
        for chunk in uris.chunks(PLAYLIST_ADD_LIMIT) {
            self.service
                .add_tracks(&playlist_id, chunk)
                .await
                .map_err(|e| CurationError::Publish(e.to_string()))?;
        }

        log::info!(
            "Published '{}' with {} tracks as {}",
            name,
            uris.len(),
            playlist_id
        );
        Ok(playlist_id)
    }

    /// Save or unsave one track on the service and mirror the flag locally.
    /// Unsaving a library-source track removes its row entirely.
    pub async fn set_track_saved(
        &self,
        source: SourceCollection,
        track_id: &str,
        saved: bool,
    ) -> Result<(), CurationError> {
        if !self.service.is_authenticated() {
            return Err(CurationError::NotAuthenticated);
        }

        let ids = vec![track_id.to_string()];
        let result = if saved {
            self.service.save_tracks(&ids).await
        } else {
            self.service.remove_saved(&ids).await
        };
        result.map_err(|e| CurationError::Sync(e.to_string()))?;

        if source == SourceCollection::Library && !saved {
            self.store.delete(SourceCollection::Library, track_id).await?;
        } else {
            self.store.set_saved(source, track_id, saved).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioFeatures;
    use crate::store::StoreManager;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Scripted streaming-service double.
    #[derive(Default)]
    struct MockService {
        authenticated: bool,
        /// Saved-status answers by id; unknown ids answer true.
        saved: HashMap<String, bool>,
        /// 0-based batch index at which contains_saved starts failing.
        fail_from_batch: Option<usize>,
        create_fails: bool,
        contains_calls: Mutex<usize>,
        created: Mutex<Vec<(String, String, bool)>>,
        added: Mutex<Vec<Vec<String>>>,
    }

    impl MockService {
        fn authenticated() -> Self {
            Self {
                authenticated: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl StreamingService for MockService {
        fn id(&self) -> &str {
            "mock"
        }

        fn is_authenticated(&self) -> bool {
            self.authenticated
        }

        async fn contains_saved(&self, ids: &[String]) -> Result<Vec<bool>> {
            let batch_index = {
                let mut calls = self.contains_calls.lock().unwrap();
                let i = *calls;
                *calls += 1;
                i
            };
            if let Some(fail_from) = self.fail_from_batch {
                if batch_index >= fail_from {
                    anyhow::bail!("simulated batch failure");
                }
            }
            Ok(ids
                .iter()
                .map(|id| *self.saved.get(id).unwrap_or(&true))
                .collect())
        }

        async fn save_tracks(&self, _ids: &[String]) -> Result<()> {
            Ok(())
        }

        async fn remove_saved(&self, _ids: &[String]) -> Result<()> {
            Ok(())
        }

        async fn create_playlist(
            &self,
            name: &str,
            description: &str,
            public: bool,
        ) -> Result<String> {
            if self.create_fails {
                anyhow::bail!("simulated create failure");
            }
            self.created
                .lock()
                .unwrap()
                .push((name.to_string(), description.to_string(), public));
            Ok("playlist-1".to_string())
        }

        async fn add_tracks(&self, _playlist_id: &str, uris: &[String]) -> Result<()> {
            self.added.lock().unwrap().push(uris.to_vec());
            Ok(())
        }
    }

    fn track_with_tempo(id: &str, name: &str, tempo: f64) -> Track {
        let mut t = Track::new(id, name, "Artist");
        t.features = Some(AudioFeatures {
            tempo: Some(tempo),
            ..Default::default()
        });
        t
    }

    async fn seeded_store(collection: SourceCollection, tracks: &[Track]) -> TrackStore {
        let store = StoreManager::in_memory().await.unwrap().tracks();
        store.put_all(collection, tracks).await.unwrap();
        store
    }

    fn abc_tracks() -> Vec<Track> {
        vec![
            track_with_tempo("a", "A", 82.0),
            track_with_tempo("b", "B", 95.0),
            track_with_tempo("c", "C", 88.0),
        ]
    }

    fn tempo_spec(min: f64, max: f64, target: usize) -> FilterSpec {
        let mut spec = FilterSpec::any(SourceCollection::DemoTracks, target);
        spec.any_tempo = false;
        spec.min_tempo = min;
        spec.max_tempo = max;
        spec
    }

    fn playlist_ids(session: &CurationSession) -> Vec<&str> {
        session.playlist.iter().map(|t| t.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_tempo_range_scenario() {
        let store = seeded_store(SourceCollection::DemoTracks, &abc_tracks()).await;
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 1);
        let mut session = CurationSession::new();

        let outcome = engine
            .run_search(&mut session, &tempo_spec(80.0, 90.0, 5))
            .await
            .unwrap();

        assert_eq!(outcome.total_matches, 2);
        assert_eq!(playlist_ids(&session), vec!["a", "c"]);
        assert!(session.pool.is_empty());
        assert!(!outcome.synced);
    }

    #[tokio::test]
    async fn test_any_tempo_samples_down_to_target() {
        let store = seeded_store(SourceCollection::DemoTracks, &abc_tracks()).await;
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 1);
        let mut session = CurationSession::new();

        let spec = FilterSpec::any(SourceCollection::DemoTracks, 1);
        let outcome = engine.run_search(&mut session, &spec).await.unwrap();

        assert_eq!(outcome.total_matches, 3);
        assert_eq!(session.playlist.len(), 1);
        assert!(["a", "b", "c"].contains(&session.playlist[0].id.as_str()));
    }

    #[tokio::test]
    async fn test_pinned_track_survives_next_search_without_duplicates() {
        let store = seeded_store(SourceCollection::DemoTracks, &abc_tracks()).await;
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 3);
        let mut session = CurationSession::new();

        let spec = FilterSpec::any(SourceCollection::DemoTracks, 2);
        engine.run_search(&mut session, &spec).await.unwrap();
        assert_eq!(session.playlist.len(), 2);

        let pinned_id = session.playlist[0].id.clone();
        assert!(session.pin(&pinned_id));

        engine.run_search(&mut session, &spec).await.unwrap();

        let ids = playlist_ids(&session);
        assert!(ids.contains(&pinned_id.as_str()));
        assert_eq!(session.playlist.len(), 2);

        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_no_match_path_is_idempotent_and_clears_pins() {
        let store = seeded_store(SourceCollection::DemoTracks, &abc_tracks()).await;
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 1);
        let mut session = CurationSession::new();

        // A successful search with a pin first, so there is state to leak.
        engine
            .run_search(&mut session, &FilterSpec::any(SourceCollection::DemoTracks, 2))
            .await
            .unwrap();
        let pinned_id = session.playlist[0].id.clone();
        session.pin(&pinned_id);

        let dead = tempo_spec(300.0, 301.0, 5);
        for _ in 0..2 {
            let outcome = engine.run_search(&mut session, &dead).await.unwrap();
            assert!(outcome.no_matches());
            assert!(session.playlist.is_empty());
            assert!(session.pool.is_empty());
        }

        // The pin lived on the cleared playlist; nothing carries it over.
        engine
            .run_search(&mut session, &FilterSpec::any(SourceCollection::DemoTracks, 3))
            .await
            .unwrap();
        assert_eq!(session.pinned_count(), 0);
    }

    #[tokio::test]
    async fn test_library_source_evicts_unsaved_tracks() {
        let tracks = vec![
            track_with_tempo("t1", "One", 100.0),
            track_with_tempo("t2", "Two", 110.0),
            track_with_tempo("t3", "Three", 120.0),
        ];
        let store = seeded_store(SourceCollection::Library, &tracks).await;

        let mut service = MockService::authenticated();
        service.saved.insert("t2".to_string(), false);
        let engine = CurationEngine::with_seed(store.clone(), Arc::new(service), 1);

        let mut session = CurationSession::new();
        let spec = FilterSpec::any(SourceCollection::Library, 5);
        let outcome = engine.run_search(&mut session, &spec).await.unwrap();

        assert!(outcome.synced);
        assert_eq!(outcome.total_matches, 3);

        let ids = playlist_ids(&session);
        assert!(!ids.contains(&"t2"));
        assert_eq!(ids.len(), 2);

        // Evicted from the store too.
        assert!(store
            .get(SourceCollection::Library, "t2")
            .await
            .unwrap()
            .is_none());
        // Survivors carry the reconciled flag.
        assert!(session.playlist.iter().all(|t| t.saved == Some(true)));
    }

    #[tokio::test]
    async fn test_partial_sync_failure_keeps_completed_batches() {
        let tracks: Vec<Track> = (0..60)
            .map(|i| {
                let id = format!("t{:02}", i);
                let name = format!("Track {:02}", i);
                track_with_tempo(&id, &name, 100.0)
            })
            .collect();
        let store = seeded_store(SourceCollection::DemoTracks, &tracks).await;

        let mut service = MockService::authenticated();
        service.fail_from_batch = Some(1); // first batch succeeds, second fails
        let engine = CurationEngine::with_seed(store, Arc::new(service), 1);

        let mut session = CurationSession::new();
        let spec = FilterSpec::any(SourceCollection::DemoTracks, 60);
        let outcome = engine.run_search(&mut session, &spec).await.unwrap();

        // Sync failed overall, but the search still produced a playlist.
        assert!(!outcome.synced);
        assert_eq!(session.playlist.len(), 60);

        // The 50 tracks of the completed batch keep their applied flags.
        let flagged = session
            .playlist
            .iter()
            .filter(|t| t.saved == Some(true))
            .count();
        assert_eq!(flagged, 50);
    }

    #[tokio::test]
    async fn test_publish_chunks_track_adds() {
        let store = StoreManager::in_memory().await.unwrap().tracks();
        let service = Arc::new(MockService::authenticated());
        let engine = CurationEngine::with_seed(store, service.clone(), 1);

        let mut session = CurationSession::new();
        for i in 0..120 {
            session
                .playlist
                .push(Track::new(format!("t{}", i), format!("Track {}", i), "A"));
        }

        let id = engine
            .publish(&session, "Morning Mix", "built by cadence", false)
            .await
            .unwrap();
        assert_eq!(id, "playlist-1");

        let created = service.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "Morning Mix");

        let added = service.added.lock().unwrap();
        let sizes: Vec<usize> = added.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![100, 20]);
        assert_eq!(added[0][0], "spotify:track:t0");
    }

    #[tokio::test]
    async fn test_publish_aborts_when_creation_fails() {
        let store = StoreManager::in_memory().await.unwrap().tracks();
        let mut service = MockService::authenticated();
        service.create_fails = true;
        let service = Arc::new(service);
        let engine = CurationEngine::with_seed(store, service.clone(), 1);

        let mut session = CurationSession::new();
        session.playlist.push(Track::new("t1", "One", "A"));

        let result = engine.publish(&session, "Mix", "", false).await;
        assert!(matches!(result, Err(CurationError::Publish(_))));
        assert!(service.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_requires_authentication() {
        let store = StoreManager::in_memory().await.unwrap().tracks();
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 1);

        let mut session = CurationSession::new();
        session.playlist.push(Track::new("t1", "One", "A"));

        let result = engine.publish(&session, "Mix", "", false).await;
        assert!(matches!(result, Err(CurationError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_refresh_pool_swaps_in_unseen_matches() {
        let tracks: Vec<Track> = (0..12)
            .map(|i| {
                let id = format!("t{:02}", i);
                let name = format!("Track {:02}", i);
                track_with_tempo(&id, &name, 100.0)
            })
            .collect();
        let store = seeded_store(SourceCollection::DemoTracks, &tracks).await;
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 5);

        let mut session = CurationSession::new();
        let spec = FilterSpec::any(SourceCollection::DemoTracks, 3);
        engine.run_search(&mut session, &spec).await.unwrap();
        assert_eq!(session.playlist.len(), 3);
        // Sampling trims the matched set to the target, so the pool starts
        // empty; fill it by hand with 7 of the unseen tracks.
        assert!(session.pool.is_empty());
        let seen: HashSet<String> = session.playlist.iter().map(|t| t.id.clone()).collect();
        let mut unseen = tracks
            .iter()
            .filter(|t| !seen.contains(&t.id))
            .cloned()
            .collect::<Vec<_>>();
        session.pool = unseen.drain(..7).collect();

        let known_before: HashSet<String> = session
            .playlist
            .iter()
            .chain(session.pool.iter())
            .map(|t| t.id.clone())
            .collect();

        let added = engine.refresh_pool(&mut session, 2).await.unwrap();
        assert_eq!(added, 2);
        assert_eq!(session.pool.len(), 7);

        // Replacements are matches the session had not seen before.
        let tail: Vec<&Track> = session.pool.iter().rev().take(added).collect();
        assert!(tail.iter().all(|t| !known_before.contains(&t.id)));
    }

    #[tokio::test]
    async fn test_refresh_pool_without_prior_search_is_noop() {
        let store = StoreManager::in_memory().await.unwrap().tracks();
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 1);
        let mut session = CurationSession::new();

        let added = engine.refresh_pool(&mut session, 5).await.unwrap();
        assert_eq!(added, 0);
    }

    #[tokio::test]
    async fn test_set_track_saved_mirrors_service_state() {
        let tracks = vec![track_with_tempo("t1", "One", 100.0)];
        let store = seeded_store(SourceCollection::Library, &tracks).await;
        let demo = vec![track_with_tempo("d1", "Demo", 100.0)];
        store
            .put_all(SourceCollection::DemoTracks, &demo)
            .await
            .unwrap();

        let engine =
            CurationEngine::with_seed(store.clone(), Arc::new(MockService::authenticated()), 1);

        // Unsaving a library track removes its row entirely.
        engine
            .set_track_saved(SourceCollection::Library, "t1", false)
            .await
            .unwrap();
        assert!(store
            .get(SourceCollection::Library, "t1")
            .await
            .unwrap()
            .is_none());

        // Saving elsewhere just mirrors the flag.
        engine
            .set_track_saved(SourceCollection::DemoTracks, "d1", true)
            .await
            .unwrap();
        let d1 = store
            .get(SourceCollection::DemoTracks, "d1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(d1.saved, Some(true));
    }

    #[tokio::test]
    async fn test_set_track_saved_requires_authentication() {
        let store = StoreManager::in_memory().await.unwrap().tracks();
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 1);

        let result = engine
            .set_track_saved(SourceCollection::Library, "t1", true)
            .await;
        assert!(matches!(result, Err(CurationError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_invalid_filter_is_rejected() {
        let store = StoreManager::in_memory().await.unwrap().tracks();
        let engine = CurationEngine::with_seed(store, Arc::new(MockService::default()), 1);
        let mut session = CurationSession::new();

        let result = engine
            .run_search(&mut session, &tempo_spec(120.0, 90.0, 5))
            .await;
        assert!(matches!(result, Err(CurationError::InvalidFilter(_))));
    }
}
