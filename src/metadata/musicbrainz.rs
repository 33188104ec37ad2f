//! MusicBrainz recording lookup by ISRC.
//!
//! Endpoint: https://musicbrainz.org/ws/2/recording?query=isrc:...
//! Rate limit: 1 request/second per MusicBrainz Terms of Service, and a
//! descriptive User-Agent is mandatory.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{header, Client};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

const MUSICBRAINZ_API_URL: &str = "https://musicbrainz.org/ws/2";

const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(1000);

const USER_AGENT: &str = "cadence/0.1.0 (playlist curation engine)";

/// Max ISRCs combined into one search query.
const ISRC_BATCH_SIZE: usize = 25;

pub struct MusicBrainzClient {
    http: Client,
    /// Last request time, for the 1 req/sec etiquette.
    rate_limiter: Mutex<Option<Instant>>,
}

impl MusicBrainzClient {
    pub fn new() -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            rate_limiter: Mutex::new(None),
        }
    }

    async fn enforce_rate_limit(&self) {
        let mut last_request = self.rate_limiter.lock().await;
        if let Some(last_time) = *last_request {
            let elapsed = last_time.elapsed();
            if elapsed < RATE_LIMIT_INTERVAL {
                sleep(RATE_LIMIT_INTERVAL - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }

    /// Resolve ISRCs to recording MBIDs, batched at [`ISRC_BATCH_SIZE`]
    /// per query. Failed batches are logged and skipped; the map holds
    /// whatever resolved.
    pub async fn lookup_isrcs(&self, isrcs: &[String]) -> HashMap<String, String> {
        let mut resolved = HashMap::new();

        for batch in isrcs.chunks(ISRC_BATCH_SIZE) {
            self.enforce_rate_limit().await;
            match self.lookup_batch(batch).await {
                Ok(found) => resolved.extend(found),
                Err(e) => {
                    log::warn!("MusicBrainz lookup failed for a batch of {}: {}", batch.len(), e);
                }
            }
        }

        log::debug!("Resolved {}/{} ISRCs to MBIDs", resolved.len(), isrcs.len());
        resolved
    }

    async fn lookup_batch(
        &self,
        isrcs: &[String],
    ) -> Result<HashMap<String, String>, super::MetadataError> {
        let query = isrcs
            .iter()
            .map(|i| format!("isrc:{}", i))
            .collect::<Vec<_>>()
            .join(" OR ");
        let url = format!(
            "{}/recording?query={}&fmt=json&limit=100",
            MUSICBRAINZ_API_URL,
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

        // Each hit lists the ISRCs it was matched through; pair the first
        // recording seen for each requested ISRC.
        let mut found = HashMap::new();
        if let Some(recordings) = data.get("recordings").and_then(|r| r.as_array()) {
            for recording in recordings {
                let Some(mbid) = recording.get("id").and_then(|v| v.as_str()) else {
                    continue;
                };
                let Some(hit_isrcs) = recording.get("isrcs").and_then(|v| v.as_array()) else {
                    continue;
                };
                for isrc in hit_isrcs.iter().filter_map(|v| v.as_str()) {
                    if isrcs.iter().any(|wanted| wanted == isrc) {
                        found
                            .entry(isrc.to_string())
                            .or_insert_with(|| mbid.to_string());
                    }
                }
            }
        }

        Ok(found)
    }
}

impl Default for MusicBrainzClient {
    fn default() -> Self {
        Self::new()
    }
}
