//! AcousticBrainz feature lookup by recording MBID.
//!
//! The bulk endpoints answer for up to 25 recordings per request, keyed by
//! MBID. High-level documents carry the mood/genre probabilities, low-level
//! documents carry BPM and loudness; both are folded into one normalized
//! [`AudioFeatures`] here so nothing downstream sees the raw shapes.

use std::collections::HashMap;

use reqwest::Client;
use serde_json::Value;

use crate::metadata::join_ids;
use crate::models::AudioFeatures;

const ACOUSTICBRAINZ_API_URL: &str = "https://acousticbrainz.org/api/v1";

const MBID_BATCH_SIZE: usize = 25;

pub struct AcousticBrainzClient {
    http: Client,
}

impl AcousticBrainzClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Fetch normalized feature vectors for the given MBIDs. Batches that
    /// fail are logged and skipped.
    pub async fn features_for(&self, mbids: &[String]) -> HashMap<String, AudioFeatures> {
        let mut features = HashMap::new();

        for batch in mbids.chunks(MBID_BATCH_SIZE) {
            let high = match self.fetch_documents("high-level", batch).await {
                Ok(docs) => docs,
                Err(e) => {
                    log::warn!("AcousticBrainz high-level fetch failed: {}", e);
                    continue;
                }
            };
            let low = match self.fetch_documents("low-level", batch).await {
                Ok(docs) => docs,
                Err(e) => {
                    log::warn!("AcousticBrainz low-level fetch failed: {}", e);
                    HashMap::new()
                }
            };

            for mbid in batch {
                let vector = normalize(high.get(mbid), low.get(mbid));
                if vector != AudioFeatures::default() {
                    features.insert(mbid.clone(), vector);
                }
            }
        }

        log::debug!("Fetched features for {}/{} recordings", features.len(), mbids.len());
        features
    }

    /// One bulk call; the response object is keyed by MBID with numbered
    /// submission documents underneath ("0" being the canonical one).
    async fn fetch_documents(
        &self,
        endpoint: &str,
        mbids: &[String],
    ) -> Result<HashMap<String, Value>, super::MetadataError> {
        let url = format!(
            "{}/{}?recording_ids={}",
            ACOUSTICBRAINZ_API_URL,
            endpoint,
            urlencoding::encode(&join_ids(mbids, ';'))
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

        let mut documents = HashMap::new();
        if let Some(map) = data.as_object() {
            for (mbid, submissions) in map {
                if let Some(doc) = submissions.get("0") {
                    documents.insert(mbid.clone(), doc.clone());
                }
            }
        }
        Ok(documents)
    }
}

impl Default for AcousticBrainzClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold high-level and low-level documents into the one feature shape the
/// matcher understands.
fn normalize(high: Option<&Value>, low: Option<&Value>) -> AudioFeatures {
    let prob = |path: &[&str]| -> Option<f64> {
        let mut cursor = high?;
        for key in path {
            cursor = cursor.get(key)?;
        }
        cursor.as_f64()
    };

    AudioFeatures {
        tempo: low
            .and_then(|d| d.get("rhythm"))
            .and_then(|r| r.get("bpm"))
            .and_then(|v| v.as_f64()),
        acousticness: prob(&["highlevel", "mood_acoustic", "all", "acoustic"]),
        instrumentalness: prob(&["highlevel", "voice_instrumental", "all", "instrumental"]),
        energy: low
            .and_then(|d| d.get("lowlevel"))
            .and_then(|l| l.get("average_loudness"))
            .and_then(|v| v.as_f64()),
        danceability: prob(&["highlevel", "danceability", "all", "danceable"]),
        valence: prob(&["highlevel", "mood_happy", "all", "happy"]),
    }
}
