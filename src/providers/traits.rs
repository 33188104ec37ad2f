use anyhow::Result;
use async_trait::async_trait;

/// Seam between the curation pipeline and the external streaming service.
///
/// The engine only ever talks to this trait, so tests substitute a scripted
/// double and the Spotify client stays swappable.
#[async_trait]
pub trait StreamingService: Send + Sync {
    /// Unique identifier (e.g., "spotify")
    fn id(&self) -> &str;

    /// Whether the service holds usable credentials. Steps that require a
    /// token check this first and skip with a warning instead of failing.
    fn is_authenticated(&self) -> bool;

    /// Saved ("liked") status for one batch of track ids, at most 50.
    ///
    /// The response is positionally aligned with `ids`: index i answers for
    /// ids[i]. That is the external API's documented contract; callers pair
    /// by index and must treat a length mismatch as an error.
    async fn contains_saved(&self, ids: &[String]) -> Result<Vec<bool>>;

    /// Save tracks to the user's library.
    async fn save_tracks(&self, ids: &[String]) -> Result<()>;

    /// Remove tracks from the user's library.
    async fn remove_saved(&self, ids: &[String]) -> Result<()>;

    /// Create an empty playlist under the authenticated user; returns the
    /// new playlist id.
    async fn create_playlist(&self, name: &str, description: &str, public: bool) -> Result<String>;

    /// Add service-native track URIs to a playlist. Callers chunk to the
    /// service's per-request cap.
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}
