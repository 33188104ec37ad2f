//! Spotify Web API integration: token refresh, the authenticated client,
//! and its `StreamingService` adapter.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod provider;

pub use client::SpotifyClient;
pub use error::SpotifyError;
pub use provider::SpotifyProvider;
