//! Access-token management via the refresh-token grant.
//!
//! The interactive OAuth dance happens out of band; we hold a long-lived
//! refresh token and exchange it for short-lived access tokens on demand.

use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::SpotifyCredentials;
use crate::spotify::error::SpotifyError;
use crate::spotify::models::TokenResponse;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// The only timeout in the system: a hung token refresh would stall every
/// authenticated step, so it gets cut short explicitly.
const TOKEN_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

pub struct TokenManager {
    http: Client,
    credentials: SpotifyCredentials,
    /// Rotated refresh token, when Spotify hands one back.
    refresh_token: RwLock<String>,
    token: RwLock<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(http: Client, credentials: SpotifyCredentials) -> Self {
        let refresh_token = credentials.refresh_token.clone();
        Self {
            http,
            credentials,
            refresh_token: RwLock::new(refresh_token),
            token: RwLock::new(None),
        }
    }

    /// Current access token, refreshing first when absent or expired.
    pub async fn access_token(&self) -> Result<String, SpotifyError> {
        {
            let guard = self.token.read().await;
            if let Some(ref cached) = *guard {
                if !cached.is_expired() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let refreshed = self.refresh().await?;
        let access_token = refreshed.access_token.clone();
        {
            let mut guard = self.token.write().await;
            *guard = Some(refreshed);
        }
        Ok(access_token)
    }

    async fn refresh(&self) -> Result<CachedToken, SpotifyError> {
        let refresh_token = self.refresh_token.read().await.clone();
        let basic = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        let response = self
            .http
            .post(TOKEN_URL)
            .header("Authorization", format!("Basic {}", basic))
            .form(&params)
            .timeout(TOKEN_REFRESH_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Token refresh rejected ({}): {}", status, body);
            return Err(SpotifyError::NotAuthenticated);
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        if let Some(rotated) = body.refresh_token {
            let mut guard = self.refresh_token.write().await;
            *guard = rotated;
        }

        let expires_at =
            Utc::now() + TimeDelta::seconds(body.expires_in as i64 - EXPIRY_MARGIN_SECS);
        log::debug!("Access token refreshed, valid until {}", expires_at);

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at,
        })
    }
}
