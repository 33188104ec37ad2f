use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpotifyError {
    /// No credentials configured, or the refresh grant was rejected.
    #[error("Not authenticated with Spotify")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Spotify API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SpotifyError {
    fn from(e: reqwest::Error) -> Self {
        SpotifyError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for SpotifyError {
    fn from(e: serde_json::Error) -> Self {
        SpotifyError::Parse(e.to_string())
    }
}
