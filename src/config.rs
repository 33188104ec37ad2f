use std::env;
use std::path::PathBuf;

use crate::errors::AppError;

/// Application configuration from environment variables.
///
/// Streaming-service credentials are optional: without them the pipeline
/// still runs against local collections, it just skips saved-status sync
/// and cannot publish.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the SQLite collection store.
    pub data_dir: PathBuf,
    pub spotify: Option<SpotifyCredentials>,
}

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    /// Long-lived refresh token obtained out of band (one-time OAuth dance).
    pub refresh_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let data_dir = match env::var("CADENCE_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .ok_or_else(|| AppError::Config("could not resolve a data directory".to_string()))?
                .join("cadence"),
        };

        let spotify = match (
            env::var("SPOTIFY_CLIENT_ID"),
            env::var("SPOTIFY_CLIENT_SECRET"),
            env::var("SPOTIFY_REFRESH_TOKEN"),
        ) {
            (Ok(client_id), Ok(client_secret), Ok(refresh_token)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => {
                log::warn!("Spotify credentials not set; running in local-only mode");
                None
            }
        };

        Ok(Self { data_dir, spotify })
    }
}
