use serde::Deserialize;

/// Token endpoint response for the refresh-token grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    /// Spotify occasionally rotates the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Subset of the current-user profile we need.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
}
