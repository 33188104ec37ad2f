//! Deezer track search, used only to find 30-second preview URLs.
//!
//! Callers issue searches one at a time and may supersede a stale in-flight
//! request with a newer one; nothing here retries or caches.

use reqwest::Client;
use serde_json::Value;

const DEEZER_API_URL: &str = "https://api.deezer.com";

pub struct DeezerClient {
    http: Client,
}

impl DeezerClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// First preview URL for a track/artist pair, if Deezer knows one.
    pub async fn search_preview(
        &self,
        track_name: &str,
        artist: &str,
    ) -> Result<Option<String>, super::MetadataError> {
        let query = format!("track:\"{}\" artist:\"{}\"", track_name, artist);
        let url = format!(
            "{}/search?q={}&limit=5",
            DEEZER_API_URL,
            urlencoding::encode(&query)
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(super::MetadataError::Network(format!(
                "HTTP {} - {}",
                status, body
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| super::MetadataError::Parse(e.to_string()))?;

        let preview = data
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|hits| {
                hits.iter().find_map(|hit| {
                    hit.get("preview")
                        .and_then(|p| p.as_str())
                        .filter(|p| !p.is_empty())
                        .map(|p| p.to_string())
                })
            });

        Ok(preview)
    }
}

impl Default for DeezerClient {
    fn default() -> Self {
        Self::new()
    }
}
