use anyhow::Result;
use async_trait::async_trait;

use crate::providers::StreamingService;
use crate::spotify::client::SpotifyClient;

/// `StreamingService` adapter over the Spotify Web API client.
pub struct SpotifyProvider {
    client: SpotifyClient,
}

impl SpotifyProvider {
    pub fn new(client: SpotifyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StreamingService for SpotifyProvider {
    fn id(&self) -> &str {
        "spotify"
    }

    fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }

    async fn contains_saved(&self, ids: &[String]) -> Result<Vec<bool>> {
        Ok(self.client.contains_saved(ids).await?)
    }

    async fn save_tracks(&self, ids: &[String]) -> Result<()> {
        Ok(self.client.save_tracks(ids).await?)
    }

    async fn remove_saved(&self, ids: &[String]) -> Result<()> {
        Ok(self.client.remove_saved(ids).await?)
    }

    async fn create_playlist(&self, name: &str, description: &str, public: bool) -> Result<String> {
        Ok(self.client.create_playlist(name, description, public).await?)
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        Ok(self.client.add_tracks(playlist_id, uris).await?)
    }
}
