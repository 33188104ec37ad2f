//! Authenticated Spotify Web API client.
//!
//! Covers the handful of endpoints the pipeline needs: bulk saved-status
//! lookup, save/unsave, playlist creation and track adds. Without
//! credentials the client still constructs; every call then fails with
//! `NotAuthenticated` and callers degrade gracefully.

use reqwest::Client;
use tokio::sync::RwLock;

use crate::config::SpotifyCredentials;
use crate::spotify::auth::TokenManager;
use crate::spotify::error::SpotifyError;
use crate::spotify::models::{CreatedPlaylist, UserProfile};

const API_BASE: &str = "https://api.spotify.com/v1";

pub struct SpotifyClient {
    http: Client,
    auth: Option<TokenManager>,
    /// Cached current-user id, fetched once per process.
    user_id: RwLock<Option<String>>,
}

impl SpotifyClient {
    pub fn new(credentials: Option<SpotifyCredentials>) -> Self {
        let http = Client::new();
        let auth = credentials.map(|c| TokenManager::new(http.clone(), c));
        Self {
            http,
            auth,
            user_id: RwLock::new(None),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    async fn bearer(&self) -> Result<String, SpotifyError> {
        match &self.auth {
            Some(manager) => manager.access_token().await,
            None => Err(SpotifyError::NotAuthenticated),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        log::warn!("Spotify API error {}: {}", status, body);
        Err(SpotifyError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Bulk saved-status check, one batch of at most 50 ids.
    ///
    /// The response array mirrors the order of `ids`; index i answers for
    /// ids[i]. The endpoint gives no id-keyed alternative.
    pub async fn contains_saved(&self, ids: &[String]) -> Result<Vec<bool>, SpotifyError> {
        let token = self.bearer().await?;
        let url = format!("{}/me/tracks/contains?ids={}", API_BASE, ids.join(","));

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let statuses: Vec<bool> = response
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;
        Ok(statuses)
    }

    pub async fn save_tracks(&self, ids: &[String]) -> Result<(), SpotifyError> {
        let token = self.bearer().await?;
        let url = format!("{}/me/tracks?ids={}", API_BASE, ids.join(","));

        let response = self
            .http
            .put(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Length", "0")
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    pub async fn remove_saved(&self, ids: &[String]) -> Result<(), SpotifyError> {
        let token = self.bearer().await?;
        let url = format!("{}/me/tracks?ids={}", API_BASE, ids.join(","));

        let response = self
            .http
            .delete(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Current user's id, cached after the first lookup.
    pub async fn current_user_id(&self) -> Result<String, SpotifyError> {
        {
            let guard = self.user_id.read().await;
            if let Some(ref id) = *guard {
                return Ok(id.clone());
            }
        }

        let token = self.bearer().await?;
        let response = self
            .http
            .get(format!("{}/me", API_BASE))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let profile: UserProfile = response
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;
        log::info!(
            "Authenticated as {} ({})",
            profile.display_name.as_deref().unwrap_or("unknown"),
            profile.id
        );

        let mut guard = self.user_id.write().await;
        *guard = Some(profile.id.clone());
        Ok(profile.id)
    }

    pub async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<String, SpotifyError> {
        let user_id = self.current_user_id().await?;
        let token = self.bearer().await?;

        let body = serde_json::json!({
            "name": name,
            "description": description,
            "public": public,
        });

        let response = self
            .http
            .post(format!("{}/users/{}/playlists", API_BASE, user_id))
            .header("Authorization", format!("Bearer {}", token))
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let created: CreatedPlaylist = response
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    pub async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), SpotifyError> {
        let token = self.bearer().await?;
        let body = serde_json::json!({ "uris": uris });

        let response = self
            .http
            .post(format!("{}/playlists/{}/tracks", API_BASE, playlist_id))
            .header("Authorization", format!("Bearer {}", token))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
