//! Playlist assembler: merge pinned carry-overs with fresh matches.

use std::collections::HashSet;

use crate::models::Track;

/// New playlist plus the residual match pool.
#[derive(Debug, Clone)]
pub struct AssemblyResult {
    pub playlist: Vec<Track>,
    /// Matches that didn't make the cut, in matched-set order.
    pub pool: Vec<Track>,
}

/// Build the next playlist from the previous one and a freshly matched set.
///
/// Every pinned track in `previous` carries over, even past `target`; a
/// pin is never dropped for capacity. Matches duplicating a pinned id are
/// discarded, then the playlist is topped up from the front of the match
/// set until it reaches `target` or the matches run out. Whatever remains
/// becomes the pool.
pub fn assemble(previous: &[Track], matches: Vec<Track>, target: usize) -> AssemblyResult {
    let mut playlist: Vec<Track> = previous.iter().filter(|t| t.pinned).cloned().collect();
    let pinned_ids: HashSet<&str> = playlist.iter().map(|t| t.id.as_str()).collect();

    let mut matches: Vec<Track> = matches
        .into_iter()
        .filter(|t| !pinned_ids.contains(t.id.as_str()))
        .collect();

    let need = target.saturating_sub(playlist.len());
    let take = need.min(matches.len());
    playlist.extend(matches.drain(..take));

    AssemblyResult {
        playlist,
        pool: matches,
    }
}
