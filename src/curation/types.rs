//! Data types for the curation pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::curation::errors::CurationError;
use crate::models::{Level, SourceCollection, Track};

fn default_max_tempo() -> f64 {
    300.0
}

fn default_target() -> usize {
    20
}

/// User-supplied filter criteria for one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub source: SourceCollection,
    /// Exclusive lower tempo bound (BPM). Ignored when `any_tempo` is set.
    #[serde(default)]
    pub min_tempo: f64,
    /// Exclusive upper tempo bound (BPM). Ignored when `any_tempo` is set.
    #[serde(default = "default_max_tempo")]
    pub max_tempo: f64,
    #[serde(default)]
    pub any_tempo: bool,
    /// Desired playlist length.
    #[serde(default = "default_target")]
    pub target: usize,
    #[serde(default)]
    pub acousticness: Level,
    #[serde(default)]
    pub instrumentalness: Level,
    #[serde(default)]
    pub energy: Level,
    #[serde(default)]
    pub danceability: Level,
    #[serde(default)]
    pub valence: Level,
}

impl FilterSpec {
    /// Wide-open filter against one collection.
    pub fn any(source: SourceCollection, target: usize) -> Self {
        Self {
            source,
            min_tempo: 0.0,
            max_tempo: default_max_tempo(),
            any_tempo: true,
            target,
            acousticness: Level::Any,
            instrumentalness: Level::Any,
            energy: Level::Any,
            danceability: Level::Any,
            valence: Level::Any,
        }
    }

    pub fn validate(&self) -> Result<(), CurationError> {
        if self.target < 1 {
            return Err(CurationError::InvalidFilter(
                "target count must be at least 1".to_string(),
            ));
        }
        if !self.any_tempo && self.min_tempo >= self.max_tempo {
            return Err(CurationError::InvalidFilter(format!(
                "min tempo {} must be below max tempo {}",
                self.min_tempo, self.max_tempo
            )));
        }
        Ok(())
    }
}

/// Summary of one completed search, for the caller to render.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// How many records in the collection matched the filter, before any
    /// downsampling. Accurate even when it exceeds the target.
    pub total_matches: usize,
    pub playlist_len: usize,
    pub pool_len: usize,
    /// False when saved-status sync was skipped or failed; the playlist
    /// then carries possibly-stale saved flags.
    pub synced: bool,
}

impl SearchOutcome {
    pub fn no_matches(&self) -> bool {
        self.playlist_len == 0
    }
}

/// Transient working set for one curation sitting: the playlist under
/// construction plus the residual match pool. Created per session, mutated
/// by searches and by direct user action, never persisted; only track ids
/// leave the process, on publish.
#[derive(Debug, Clone)]
pub struct CurationSession {
    pub id: Uuid,
    /// Ordered by insertion. Ids are unique.
    pub playlist: Vec<Track>,
    /// Matches that didn't fit the target; surfaced as "more matches".
    pub pool: Vec<Track>,
    /// Filter behind the current playlist/pool, kept for pool refreshes.
    pub last_filter: Option<FilterSpec>,
}

impl CurationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            playlist: Vec::new(),
            pool: Vec::new(),
            last_filter: None,
        }
    }

    /// Clear all derived state. Pinned flags live on the playlist entries,
    /// so they are gone too; a pin does not outlive its playlist.
    pub fn reset(&mut self) {
        self.playlist.clear();
        self.pool.clear();
        self.last_filter = None;
    }

    /// Mark a playlist entry to survive future re-filtering.
    pub fn pin(&mut self, id: &str) -> bool {
        match self.playlist.iter_mut().find(|t| t.id == id) {
            Some(track) => {
                track.pinned = true;
                true
            }
            None => false,
        }
    }

    pub fn unpin(&mut self, id: &str) -> bool {
        match self.playlist.iter_mut().find(|t| t.id == id) {
            Some(track) => {
                track.pinned = false;
                true
            }
            None => false,
        }
    }

    /// Remove an entry from the playlist by user action.
    pub fn remove(&mut self, id: &str) -> Option<Track> {
        let idx = self.playlist.iter().position(|t| t.id == id)?;
        Some(self.playlist.remove(idx))
    }

    /// Move a track from the match pool into the playlist.
    pub fn add_from_pool(&mut self, id: &str) -> bool {
        let Some(idx) = self.pool.iter().position(|t| t.id == id) else {
            return false;
        };
        let track = self.pool.remove(idx);
        self.playlist.push(track);
        true
    }

    pub fn pinned_count(&self) -> usize {
        self.playlist.iter().filter(|t| t.pinned).count()
    }
}

impl Default for CurationSession {
    fn default() -> Self {
        Self::new()
    }
}
