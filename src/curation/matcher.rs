//! Feature matcher: does one track satisfy a filter specification.

use crate::curation::types::FilterSpec;
use crate::models::{AudioFeatures, Level, Track};

/// Tolerance around a bucketed attribute's numeric target. A value matches
/// when it falls in `[target - TOLERANCE, target + TOLERANCE)`: inclusive
/// below, exclusive above.
pub const TOLERANCE: f64 = 0.2;

/// Whether `track` satisfies `spec`. Pure and deterministic; runs once per
/// record scanned. A missing feature value under an active constraint is a
/// non-match, never an error.
pub fn matches(track: &Track, spec: &FilterSpec) -> bool {
    static EMPTY: AudioFeatures = AudioFeatures {
        tempo: None,
        acousticness: None,
        instrumentalness: None,
        energy: None,
        danceability: None,
        valence: None,
    };
    let features = track.features.as_ref().unwrap_or(&EMPTY);

    if !spec.any_tempo && !tempo_in_range(features.tempo, spec.min_tempo, spec.max_tempo) {
        return false;
    }

    level_matches(features.acousticness, spec.acousticness)
        && level_matches(features.instrumentalness, spec.instrumentalness)
        && level_matches(features.energy, spec.energy)
        && level_matches(features.danceability, spec.danceability)
        && level_matches(features.valence, spec.valence)
}

/// Both bounds are exclusive: a track at exactly min or max BPM is out.
fn tempo_in_range(tempo: Option<f64>, min: f64, max: f64) -> bool {
    match tempo {
        Some(t) => t > min && t < max,
        None => false,
    }
}

fn level_matches(value: Option<f64>, level: Level) -> bool {
    let Some(target) = level.target() else {
        return true;
    };
    match value {
        Some(v) => v >= target - TOLERANCE && v < target + TOLERANCE,
        None => false,
    }
}
