use crate::errors::AppError;
use crate::models::{SourceCollection, Track};
use crate::store::TrackStore;

/// Bundled demo dataset for running the pipeline without a linked account.
const DEMO_TRACKS_JSON: &str = include_str!("demo_tracks.json");

/// Populate the demo collection if it is empty. Returns how many tracks
/// were imported (0 when the collection was already seeded).
pub async fn seed_demo_tracks(store: &TrackStore) -> Result<usize, AppError> {
    if store.count(SourceCollection::DemoTracks).await? > 0 {
        return Ok(0);
    }

    let tracks: Vec<Track> = serde_json::from_str(DEMO_TRACKS_JSON)?;

    store.put_all(SourceCollection::DemoTracks, &tracks).await?;
    Ok(tracks.len())
}
