//! Apple Podcasts lookup + direct-download strategy (spec §4.4
//! "ApplePodcasts").

use std::path::Path;

use async_trait::async_trait;

use crate::audio::strategies::direct::DirectStrategy;
use crate::audio::strategies::{DownloadStrategy, StrategyFailure, StrategyName};
use crate::constants::fetcher::TITLE_OVERLAP_THRESHOLD;
use crate::podcast::itunes::{title_overlap, ItunesClient};
use crate::podcast::models::Episode;

pub struct ApplePodcastsStrategy {
    itunes: ItunesClient,
    direct: DirectStrategy,
}

impl ApplePodcastsStrategy {
    pub fn new() -> Self {
        Self {
            itunes: ItunesClient::new(),
            direct: DirectStrategy::new(),
        }
    }

    /// Resolve the Apple-advertised episode URL via fuzzy title match.
    async fn resolve_enclosure_url(&self, apple_id: &str, episode_title: &str) -> Option<String> {
        let entries = self.itunes.episodes_for_podcast(apple_id).await.ok()?;
        entries
            .into_iter()
            .filter_map(|e| {
                let track = e.track_name.clone()?;
                let score = title_overlap(&track, episode_title);
                Some((score, e))
            })
            .filter(|(score, _)| *score >= TITLE_OVERLAP_THRESHOLD)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .and_then(|(_, entry)| entry.feed_url)
    }
}

impl Default for ApplePodcastsStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DownloadStrategy for ApplePodcastsStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::ApplePodcasts
    }

    fn can_handle(&self, _url: &str, _podcast: &str) -> bool {
        // Handled at the router level: this strategy is only selected when
        // the episode carries an `apple_podcast_id`.
        true
    }

    async fn download(&self, _url: &str, output_path: &Path, episode: &Episode) -> Result<(), StrategyFailure> {
        let apple_id = episode
            .apple_podcast_id
            .as_ref()
            .ok_or_else(|| StrategyFailure::new(false, "episode has no apple_podcast_id"))?;

        let resolved_url = self
            .resolve_enclosure_url(apple_id, &episode.title)
            .await
            .ok_or_else(|| StrategyFailure::new(true, "no matching Apple episode found"))?;

        self.direct.download(&resolved_url, output_path, episode).await
    }
}
