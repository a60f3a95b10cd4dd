//! C4 — the download router (spec §4.4).
//!
//! Builds an ordered strategy chain per podcast/URL combination, tries each
//! strategy in turn with a per-strategy stage timeout and a global
//! per-episode timeout, and records the winning strategy back to the store
//! for future MRU biasing.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::audio::strategies::apple_podcasts::ApplePodcastsStrategy;
use crate::audio::strategies::browser::BrowserStrategy;
use crate::audio::strategies::direct::DirectStrategy;
use crate::audio::strategies::youtube::YoutubeStrategy;
use crate::audio::strategies::{DownloadStrategy, StrategyName};
use crate::constants::download::{EPISODE_TIMEOUT, STAGE_TIMEOUT, STRATEGY_BACKOFF};
use crate::podcast::models::Episode;
use crate::store::Store;

/// Podcast-specific routing rules, in priority order (spec §4.3/§4.4
/// "Strategy ordering"). Podcasts not listed fall back to `DEFAULT_CHAIN`.
const ROUTING_RULES: &[(&str, &[StrategyName])] = &[
    ("American Optimist", &[StrategyName::Youtube, StrategyName::Browser]),
    (
        "Dwarkesh Podcast",
        &[StrategyName::Youtube, StrategyName::ApplePodcasts, StrategyName::Browser],
    ),
    (
        "The Drive",
        &[StrategyName::ApplePodcasts, StrategyName::Youtube, StrategyName::Direct],
    ),
    (
        "A16Z",
        &[StrategyName::ApplePodcasts, StrategyName::Direct, StrategyName::Youtube],
    ),
    ("BG2 Pod", &[StrategyName::Direct, StrategyName::ApplePodcasts]),
    (
        "All-In",
        &[StrategyName::Direct, StrategyName::ApplePodcasts, StrategyName::Youtube],
    ),
    (
        "The Tim Ferriss Show",
        &[StrategyName::Direct, StrategyName::ApplePodcasts, StrategyName::Youtube],
    ),
    (
        "Lex Fridman",
        &[StrategyName::Direct, StrategyName::ApplePodcasts, StrategyName::Youtube],
    ),
    (
        "Huberman Lab",
        &[StrategyName::Direct, StrategyName::ApplePodcasts, StrategyName::Youtube],
    ),
];

const DEFAULT_CHAIN: &[StrategyName] = &[
    StrategyName::Direct,
    StrategyName::ApplePodcasts,
    StrategyName::Youtube,
    StrategyName::Browser,
];

/// Podcasts known to sit behind Cloudflare or similar bot protection; Direct
/// is stripped from their chain regardless of routing rule (spec §4.4).
const CLOUDFLARE_PROTECTED: &[&str] = &["American Optimist", "Dwarkesh Podcast"];

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("all {attempted} strategies failed for {podcast} / {episode_title}: {last_error}")]
    AllStrategiesFailed {
        podcast: String,
        episode_title: String,
        attempted: usize,
        last_error: String,
    },
    #[error("episode timeout exceeded after {0:?}")]
    EpisodeTimeout(Duration),
    #[error("cancelled")]
    Cancelled,
}

pub struct Router {
    direct: DirectStrategy,
    apple: ApplePodcastsStrategy,
    youtube: YoutubeStrategy,
    browser: BrowserStrategy,
    store: Store,
}

impl Router {
    pub fn new(store: Store, cookie_file: Option<std::path::PathBuf>) -> Self {
        Self {
            direct: DirectStrategy::new(),
            apple: ApplePodcastsStrategy::new(),
            youtube: YoutubeStrategy::new(cookie_file),
            browser: BrowserStrategy::new(),
            store,
        }
    }

    fn strategy_for(&self, name: StrategyName) -> Option<&dyn DownloadStrategy> {
        match name {
            StrategyName::Direct => Some(&self.direct),
            StrategyName::ApplePodcasts => Some(&self.apple),
            StrategyName::Youtube => Some(&self.youtube),
            StrategyName::Browser if BrowserStrategy::is_available() => Some(&self.browser),
            StrategyName::Browser => None,
        }
    }

    /// Determine the ordered list of strategies to try for this episode,
    /// combining MRU history, the routing-rule table, a YouTube-URL
    /// override, and Cloudflare-protection stripping (spec §4.4).
    pub async fn strategy_order(&self, podcast: &str, audio_url: &str) -> Vec<StrategyName> {
        if audio_url.contains("youtube.com") || audio_url.contains("youtu.be") {
            return vec![StrategyName::Youtube, StrategyName::Browser];
        }

        let historical: Vec<StrategyName> = self
            .store
            .load_strategy_history(podcast)
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|s| StrategyName::parse(s))
            .collect();

        let default_chain = ROUTING_RULES
            .iter()
            .find(|(p, _)| *p == podcast)
            .map(|(_, chain)| *chain)
            .unwrap_or(DEFAULT_CHAIN);

        let mut order = historical;
        for name in default_chain {
            if !order.contains(name) {
                order.push(*name);
            }
        }

        if audio_url.contains("substack.com") || CLOUDFLARE_PROTECTED.contains(&podcast) {
            order.retain(|s| *s != StrategyName::Direct);
        }

        order
    }

    /// Try each strategy in the computed order, respecting a per-strategy
    /// stage timeout and a global per-episode timeout, until one succeeds.
    pub async fn download(
        &self,
        episode: &Episode,
        audio_url: &str,
        output_path: &std::path::Path,
    ) -> Result<StrategyName, DownloadError> {
        let order = self.strategy_order(&episode.podcast, audio_url).await;
        let deadline = Instant::now() + EPISODE_TIMEOUT;

        let mut last_error = String::from("no strategy was able to handle this episode");
        let mut attempted = 0usize;

        for name in &order {
            if Instant::now() >= deadline {
                return Err(DownloadError::EpisodeTimeout(EPISODE_TIMEOUT));
            }

            let Some(strategy) = self.strategy_for(*name) else {
                continue;
            };
            if !strategy.can_handle(audio_url, &episode.podcast) {
                continue;
            }

            attempted += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let stage_budget = remaining.min(STAGE_TIMEOUT);

            let attempt = tokio::time::timeout(stage_budget, strategy.download(audio_url, output_path, episode)).await;

            match attempt {
                Ok(Ok(())) => {
                    let _ = self.store.record_download_strategy(&episode.podcast, name.as_str()).await;
                    return Ok(*name);
                }
                Ok(Err(failure)) => {
                    last_error = format!("{name}: {failure}");
                }
                Err(_) => {
                    last_error = format!("{name}: stage timeout after {stage_budget:?}");
                }
            }

            if Instant::now() < deadline {
                tokio::time::sleep(STRATEGY_BACKOFF).await;
            }
        }

        Err(DownloadError::AllStrategiesFailed {
            podcast: episode.podcast.clone(),
            episode_title: episode.title.clone(),
            attempted,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::podcast::models::Episode;

    fn sample_episode(podcast: &str) -> Episode {
        Episode {
            podcast: podcast.into(),
            title: "Ep 1".into(),
            published: 1_700_000_000,
            audio_url: Some("https://cdn.example.com/ep.mp3".into()),
            transcript_url: None,
            description: None,
            link: None,
            guid: None,
            duration: None,
            apple_podcast_id: None,
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn youtube_url_forces_youtube_first_chain() {
        let store = Store::open_in_memory().unwrap();
        let router = Router::new(store, None);
        let order = router.strategy_order("Lex Fridman", "https://www.youtube.com/watch?v=abc").await;
        assert_eq!(order, vec![StrategyName::Youtube, StrategyName::Browser]);
    }

    #[tokio::test]
    async fn cloudflare_protected_podcast_strips_direct() {
        let store = Store::open_in_memory().unwrap();
        let router = Router::new(store, None);
        let order = router.strategy_order("Dwarkesh Podcast", "https://cdn.example.com/ep.mp3").await;
        assert!(!order.contains(&StrategyName::Direct));
        assert_eq!(order.first(), Some(&StrategyName::Youtube));
    }

    #[tokio::test]
    async fn unknown_podcast_uses_default_chain() {
        let store = Store::open_in_memory().unwrap();
        let router = Router::new(store, None);
        let order = router.strategy_order("Some New Show", "https://cdn.example.com/ep.mp3").await;
        assert_eq!(order, DEFAULT_CHAIN.to_vec());
    }

    #[tokio::test]
    async fn historical_success_is_tried_first() {
        let store = Store::open_in_memory().unwrap();
        store.record_download_strategy("Some New Show", "youtube").await.unwrap();
        let router = Router::new(store, None);
        let order = router.strategy_order("Some New Show", "https://cdn.example.com/ep.mp3").await;
        assert_eq!(order.first(), Some(&StrategyName::Youtube));
    }

    #[tokio::test]
    async fn download_reports_all_strategies_failed_when_none_can_handle_url() {
        let store = Store::open_in_memory().unwrap();
        let router = Router::new(store, None);
        let episode = sample_episode("Some New Show");
        let out = std::env::temp_dir().join("router_test_unhandleable.mp3");

        // A malformed URL: Direct and YouTube decline (Direct requires an
        // http(s) scheme, YouTube needs a youtube URL or a known podcast),
        // leaving only ApplePodcasts to attempt and fail immediately since
        // the episode carries no `apple_podcast_id`.
        let err = router.download(&episode, "not-a-url", &out).await.unwrap_err();
        match err {
            DownloadError::AllStrategiesFailed { attempted, .. } => assert_eq!(attempted, 1),
            other => panic!("expected AllStrategiesFailed, got {other:?}"),
        }
    }
}
