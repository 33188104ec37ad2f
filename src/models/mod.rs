use serde::{Deserialize, Serialize};

/// Bucketed level for a probability-scored audio attribute.
///
/// `Any` disables the check for that attribute. The other three map onto
/// numeric targets (see [`Level::target`]) matched with a fixed tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Any,
    Low,
    Medium,
    High,
}

impl Level {
    /// Numeric target on the [0,1] probability scale, or `None` for `Any`.
    pub fn target(&self) -> Option<f64> {
        match self {
            Level::Any => None,
            Level::Low => Some(0.2),
            Level::Medium => Some(0.5),
            Level::High => Some(0.8),
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" => Ok(Level::Any),
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            _ => Err(format!("Invalid level: {}", s)),
        }
    }
}

/// Named partition of the local store a search can run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceCollection {
    /// The user's saved ("liked") tracks.
    Library,
    TopArtists,
    /// Rank-ordered; rows carry an ordinal `position`.
    TopTracks,
    Recommendations,
    DemoTracks,
}

impl SourceCollection {
    pub fn as_str(&self) -> &str {
        match self {
            SourceCollection::Library => "library",
            SourceCollection::TopArtists => "topArtists",
            SourceCollection::TopTracks => "topTracks",
            SourceCollection::Recommendations => "recommendations",
            SourceCollection::DemoTracks => "demoTracks",
        }
    }
}

/// Normalized per-track audio attributes used for filtering.
///
/// Every source collection is mapped into this one shape before matching,
/// so the matcher never sees a raw provider schema. All probability scores
/// live on [0,1]; `tempo` is beats per minute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub tempo: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
}

/// A track record as held in the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Source-service track id, unique within a collection.
    pub id: String,
    pub name: String,
    /// Display string, multiple artists joined with ", ".
    pub artists: String,
    pub album: Option<String>,
    pub duration_ms: u32,
    pub external_url: Option<String>,
    pub preview_url: Option<String>,
    pub isrc: Option<String>,
    /// Tri-state: absent until reconciled against the streaming service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<bool>,
    /// Session-only; user-set, survives re-search, never persisted.
    #[serde(default)]
    pub pinned: bool,
    /// Rank within rank-ordered collections (top tracks).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<AudioFeatures>,
}

impl Track {
    /// Bare record with only identity and display fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, artists: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists: artists.into(),
            album: None,
            duration_ms: 0,
            external_url: None,
            preview_url: None,
            isrc: None,
            saved: None,
            pinned: false,
            position: None,
            features: None,
        }
    }

    /// Service-native URI used when publishing playlists.
    pub fn uri(&self) -> String {
        format!("spotify:track:{}", self.id)
    }
}
