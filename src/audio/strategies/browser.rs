//! Headless-browser download strategy (spec §4.4 "Browser") — the
//! last-resort fallback for heavily protected content.
//!
//! Treated as an optional dependency: when the `browser-automation` feature
//! is disabled, [`BrowserStrategy::is_available`] returns `false` and the
//! router omits it from the chain rather than failing.

use std::path::Path;

use async_trait::async_trait;

use crate::audio::strategies::{DownloadStrategy, StrategyFailure, StrategyName};
use crate::podcast::models::Episode;

pub struct BrowserStrategy;

impl BrowserStrategy {
    pub fn new() -> Self {
        Self
    }

    pub fn is_available() -> bool {
        cfg!(feature = "browser-automation")
    }
}

impl Default for BrowserStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DownloadStrategy for BrowserStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::Browser
    }

    fn can_handle(&self, _url: &str, _podcast: &str) -> bool {
        Self::is_available()
    }

    #[cfg(feature = "browser-automation")]
    async fn download(&self, _url: &str, output_path: &Path, episode: &Episode) -> Result<(), StrategyFailure> {
        imp::download(episode, output_path).await
    }

    #[cfg(not(feature = "browser-automation"))]
    async fn download(&self, _url: &str, _output_path: &Path, _episode: &Episode) -> Result<(), StrategyFailure> {
        Err(StrategyFailure::new(false, "browser automation not compiled in"))
    }
}

#[cfg(feature = "browser-automation")]
mod imp {
    use std::path::Path;
    use std::time::Duration;

    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventResponseReceived};
    use chromiumoxide::page::Page;
    use futures_util::StreamExt;

    use super::StrategyFailure;
    use crate::podcast::models::Episode;

    const MIN_CANDIDATE_BYTES: u64 = 1_000_000;
    /// How long to let network traffic settle before picking a winner.
    const COLLECTION_WINDOW: Duration = Duration::from_secs(8);

    /// Launch a headless browser, navigate to the episode's webpage, and
    /// passively collect audio-typed network responses over 1 MB, picking
    /// the largest as the best candidate (spec §4.4: "observes network
    /// traffic for audio-typed responses over 1 MB ... highest-scoring URL").
    pub async fn download(episode: &Episode, output_path: &Path) -> Result<(), StrategyFailure> {
        let link = episode
            .link
            .as_ref()
            .ok_or_else(|| StrategyFailure::new(false, "episode has no webpage link to navigate to"))?;

        let config = BrowserConfig::builder()
            .no_sandbox()
            .build()
            .map_err(|e| StrategyFailure::new(false, format!("browser config error: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| StrategyFailure::new(true, format!("failed to launch browser: {e}")))?;

        let handle = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page(link.as_str())
            .await
            .map_err(|e| StrategyFailure::new(true, format!("navigation failed: {e}")))?;

        page.execute(EnableParams::default())
            .await
            .map_err(|e| StrategyFailure::new(true, format!("failed to enable network domain: {e}")))?;

        let _ = page.find_element("audio, button, [aria-label*='play' i]").await;

        let candidate = best_audio_response(&page).await;
        browser.close().await.ok();
        handle.abort();

        let candidate = candidate.ok_or_else(|| StrategyFailure::new(true, "no audio response observed over 1 MB"))?;

        super::super::direct::DirectStrategy::new()
            .download(&candidate, output_path, episode)
            .await
    }

    /// Collect `Network.responseReceived` events for [`COLLECTION_WINDOW`]
    /// and return the URL of the largest audio-typed response seen, if any
    /// cleared [`MIN_CANDIDATE_BYTES`].
    async fn best_audio_response(page: &Page) -> Option<String> {
        let mut events = page.event_listener::<EventResponseReceived>().await.ok()?;
        let mut best: Option<(u64, String)> = None;

        let collect = async {
            while let Some(event) = events.next().await {
                let response = &event.response;
                if !is_audio_response(&response.mime_type, &response.url) {
                    continue;
                }
                let size = match content_length(response) {
                    Some(size) => size,
                    None => continue,
                };
                if size < MIN_CANDIDATE_BYTES {
                    continue;
                }
                if best.as_ref().map(|(best_size, _)| size > *best_size).unwrap_or(true) {
                    best = Some((size, response.url.clone()));
                }
            }
        };

        tokio::select! {
            _ = collect => {},
            _ = tokio::time::sleep(COLLECTION_WINDOW) => {},
        }

        best.map(|(_, url)| url)
    }

    fn is_audio_response(mime_type: &str, url: &str) -> bool {
        mime_type.starts_with("audio/")
            || url.contains(".mp3")
            || url.contains(".m4a")
            || url.contains(".aac")
    }

    /// Read the `content-length` response header, case-insensitively.
    fn content_length(response: &chromiumoxide::cdp::browser_protocol::network::Response) -> Option<u64> {
        let (_, value) = response.headers.inner().as_object()?.iter().find(|(key, _)| key.eq_ignore_ascii_case("content-length"))?;

        value.as_u64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    }
}
