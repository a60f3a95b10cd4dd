//! Direct HTTP download strategy (spec §4.4 "Direct").

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::audio::progress::{download_with_progress_timeout, ProgressParams};
use crate::audio::validation::is_valid_audio_file;
use crate::audio::strategies::{DownloadStrategy, StrategyFailure, StrategyName};
use crate::podcast::models::Episode;

/// Podcasts whose feeds sit behind Cloudflare or similar bot protection;
/// Direct downloads against them reliably fail, so this strategy declines
/// to handle them up front (spec §4.4 "Special handling").
const INCOMPATIBLE_PODCASTS: &[&str] = &["American Optimist", "Dwarkesh Podcast"];

pub struct DirectStrategy {
    client: Client,
}

impl DirectStrategy {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(crate::constants::network::USER_AGENT)
            .connect_timeout(crate::constants::network::CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(60 * 60))
            .redirect(reqwest::redirect::Policy::limited(crate::constants::network::MAX_REDIRECTS))
            .build()
            .expect("failed to build direct-download HTTP client");
        Self { client }
    }
}

impl Default for DirectStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DownloadStrategy for DirectStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::Direct
    }

    fn can_handle(&self, url: &str, podcast: &str) -> bool {
        if url.contains("substack.com") {
            return false;
        }
        if INCOMPATIBLE_PODCASTS.contains(&podcast) {
            return false;
        }
        url.starts_with("http://") || url.starts_with("https://")
    }

    async fn download(&self, url: &str, output_path: &Path, _episode: &Episode) -> Result<(), StrategyFailure> {
        let params = ProgressParams::default();
        let bytes = download_with_progress_timeout(&self.client, url, output_path, &params)
            .await
            .map_err(|e| {
                let retryable = !matches!(e, crate::audio::progress::StreamFailure::Http(code) if (400..500).contains(&code));
                StrategyFailure::new(retryable, e.to_string())
            })?;

        if bytes < crate::constants::download::MIN_VALID_FILE_SIZE {
            let _ = crate::utils::fs::remove_if_exists(output_path).await;
            return Err(StrategyFailure::new(false, "downloaded file too small"));
        }

        match is_valid_audio_file(output_path).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                let _ = crate::utils::fs::remove_if_exists(output_path).await;
                Err(StrategyFailure::new(false, "audio validation failed"))
            }
            Err(e) => {
                let _ = crate::utils::fs::remove_if_exists(output_path).await;
                Err(StrategyFailure::new(true, format!("validation io error: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declines_substack_urls() {
        let strategy = DirectStrategy::new();
        assert!(!strategy.can_handle("https://api.substack.com/feed/podcast/123/audio.mp3", "Some Show"));
    }

    #[test]
    fn declines_known_incompatible_podcasts() {
        let strategy = DirectStrategy::new();
        assert!(!strategy.can_handle("https://cdn.example.com/ep.mp3", "Dwarkesh Podcast"));
        assert!(!strategy.can_handle("https://cdn.example.com/ep.mp3", "American Optimist"));
    }

    #[test]
    fn accepts_ordinary_http_urls() {
        let strategy = DirectStrategy::new();
        assert!(strategy.can_handle("https://cdn.example.com/ep.mp3", "Lex Fridman"));
    }
}
